//! Vector store for chunk embeddings: similarity search plus on-disk persistence.
//!
//! The store is saved as `index.json` inside the index directory. Saving writes a
//! complete staging directory next to the target and swaps it in, so readers see
//! either the previous index or the new one, never a half-written file.
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chunks::Chunk;

/// File holding the serialized store inside the index directory.
pub const INDEX_FILE: &str = "index.json";
const FORMAT_VERSION: u32 = 1;

/// A chunk with its embedding, stored for similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    /// Normalized embedding vector (unit length for cosine similarity via dot product).
    embedding: Vec<f32>,
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity to the query, -1–1.
    pub score: f32,
}

/// Holds chunks and their embeddings; supports similarity search.
#[derive(Debug, Serialize, Deserialize)]
pub struct VectorStore {
    version: u32,
    /// Embedding model that produced the vectors. Queries must use the same one.
    model: String,
    /// Vector length; 0 until the first chunk is added.
    dimension: usize,
    items: Vec<IndexedChunk>,
}

impl VectorStore {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            version: FORMAT_VERSION,
            model: model.into(),
            dimension: 0,
            items: Vec::new(),
        }
    }

    /// Add a chunk with its embedding. Embedding is normalized before storage.
    pub fn add(&mut self, chunk: Chunk, embedding: Vec<f32>) -> Result<(), StoreError> {
        if embedding.is_empty() {
            return Err(StoreError::EmptyEmbedding);
        }
        if self.dimension == 0 {
            self.dimension = embedding.len();
        } else if embedding.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        self.items.push(IndexedChunk {
            chunk,
            embedding: normalize(&embedding),
        });
        Ok(())
    }

    /// Add multiple chunks with embeddings in one batch.
    pub fn add_batch(&mut self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<(), StoreError> {
        if chunks.len() != embeddings.len() {
            return Err(StoreError::CountMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }
        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            self.add(chunk, embedding)?;
        }
        Ok(())
    }

    /// Search for chunks most similar to the query embedding. Returns up to k results,
    /// best first. Equal scores keep insertion order.
    pub fn search(&self, query_embedding: &[f32], k: usize) -> Vec<ScoredChunk> {
        if self.items.is_empty() || query_embedding.is_empty() || k == 0 {
            return Vec::new();
        }
        let q_norm = normalize(query_embedding);
        let mut scored: Vec<ScoredChunk> = self
            .items
            .iter()
            .map(|ic| ScoredChunk {
                chunk: ic.chunk.clone(),
                score: dot(&q_norm, &ic.embedding),
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.items.iter().map(|ic| &ic.chunk)
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True if `dir` holds a saved store.
    pub fn exists(dir: &Path) -> bool {
        dir.join(INDEX_FILE).is_file()
    }

    /// Load a store saved with [`VectorStore::save`].
    pub fn load(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(INDEX_FILE);
        if !path.is_file() {
            return Err(StoreError::NotFound(dir.to_path_buf()));
        }
        let file = fs::File::open(&path).map_err(|e| StoreError::Io(path.clone(), e))?;
        let store: Self = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| StoreError::Corrupt(path.clone(), e))?;
        if store.version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion(store.version));
        }
        tracing::debug!(dir = %dir.display(), chunks = store.len(), "loaded index");
        Ok(store)
    }

    /// Save to `dir`, replacing a previously saved store. `dir` must be missing,
    /// empty, or hold a saved store; anything else is left alone.
    pub fn save(&self, dir: &Path) -> Result<(), StoreError> {
        if dir.exists() && !Self::exists(dir) && !is_empty_dir(dir)? {
            return Err(StoreError::NotAnIndex(dir.to_path_buf()));
        }
        let name = dir
            .file_name()
            .ok_or_else(|| StoreError::InvalidPath(dir.to_path_buf()))?
            .to_string_lossy()
            .into_owned();
        let sibling = |tag: &str| dir.with_file_name(format!(".{name}.{tag}-{}", std::process::id()));
        let staging = sibling("staging");
        let backup = sibling("old");

        if let Some(parent) = dir.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io(parent.to_path_buf(), e))?;
        }
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| StoreError::Io(staging.clone(), e))?;
        }
        if let Err(e) = self.write_into(&staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        let had_previous = dir.exists();
        if had_previous {
            fs::rename(dir, &backup).map_err(|e| StoreError::Io(dir.to_path_buf(), e))?;
        }
        if let Err(e) = fs::rename(&staging, dir) {
            if had_previous {
                let _ = fs::rename(&backup, dir);
            }
            let _ = fs::remove_dir_all(&staging);
            return Err(StoreError::Io(dir.to_path_buf(), e));
        }
        if had_previous {
            if let Err(e) = fs::remove_dir_all(&backup) {
                tracing::warn!(path = %backup.display(), "could not remove previous index: {e}");
            }
        }
        tracing::debug!(dir = %dir.display(), chunks = self.len(), "saved index");
        Ok(())
    }

    fn write_into(&self, staging: &Path) -> Result<(), StoreError> {
        fs::create_dir_all(staging).map_err(|e| StoreError::Io(staging.to_path_buf(), e))?;
        let path = staging.join(INDEX_FILE);
        let file = fs::File::create(&path).map_err(|e| StoreError::Io(path.clone(), e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self).map_err(|e| StoreError::Serialize(path.clone(), e))?;
        writer.flush().map_err(|e| StoreError::Io(path.clone(), e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| StoreError::Io(path.clone(), e))
    }
}

fn is_empty_dir(dir: &Path) -> Result<bool, StoreError> {
    if !dir.is_dir() {
        return Ok(false);
    }
    let mut entries = fs::read_dir(dir).map_err(|e| StoreError::Io(dir.to_path_buf(), e))?;
    Ok(entries.next().is_none())
}

fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no index found at {0}")]
    NotFound(PathBuf),
    #[error("index file {0} is unreadable: {1}")]
    Corrupt(PathBuf, serde_json::Error),
    #[error("unsupported index format version {0}")]
    UnsupportedVersion(u32),
    #[error("failed to serialize index to {0}: {1}")]
    Serialize(PathBuf, serde_json::Error),
    #[error("I/O error at {0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("{0} exists and is not an index directory; refusing to replace it")]
    NotAnIndex(PathBuf),
    #[error("index path has no directory name: {0}")]
    InvalidPath(PathBuf),
    #[error("embedding is empty")]
    EmptyEmbedding,
    #[error("embedding has {actual} dimensions, index uses {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("{chunks} chunks but {embeddings} embeddings")]
    CountMismatch { chunks: usize, embeddings: usize },
}
