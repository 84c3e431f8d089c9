//! Index pipeline: extract → chunk → embed → store. Replaces the index on disk.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::chunks::{chunk_documents, ChunkError, TextSplitter};
use crate::config::Config;
use crate::extract::{extract_document, ExtractError, PdfSource};
use crate::provider::{Embedder, ProviderError};
use crate::store::{StoreError, VectorStore};

/// What a build produced.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub documents: usize,
    pub pages: usize,
    /// Characters of extracted text across all documents.
    pub characters: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub index_dir: PathBuf,
}

/// Builds the persisted index from a set of PDFs.
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    splitter: TextSplitter,
    index_dir: PathBuf,
}

impl Indexer {
    pub fn new(config: &Config, embedder: Arc<dyn Embedder>) -> Result<Self, IndexError> {
        let splitter = TextSplitter::new(config.chunking.max_chars, config.chunking.overlap)?;
        Ok(Self {
            embedder,
            splitter,
            index_dir: config.index.dir.clone(),
        })
    }

    /// Runs the full pipeline and replaces the index. On any error the previous
    /// index (if there was one) is left untouched.
    pub async fn build(&self, sources: &[PdfSource]) -> Result<BuildReport, IndexError> {
        if sources.is_empty() {
            return Err(IndexError::NoDocuments);
        }

        let mut texts = Vec::with_capacity(sources.len());
        let mut pages = 0;
        for source in sources {
            let doc = extract_document(&source.bytes).map_err(|e| IndexError::Extract {
                name: source.name.clone(),
                source: e,
            })?;
            tracing::info!(
                document = %source.name,
                pages = doc.pages,
                chars = doc.text.chars().count(),
                "extracted text"
            );
            pages += doc.pages;
            texts.push((source.name.as_str(), doc.text));
        }
        let characters = texts.iter().map(|(_, t)| t.chars().count()).sum();

        let chunks = chunk_documents(
            texts.iter().map(|(name, text)| (*name, text.as_str())),
            &self.splitter,
        );
        if chunks.is_empty() {
            return Err(IndexError::NoText);
        }

        let inputs: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_documents(&inputs).await?;

        let mut store = VectorStore::new(self.embedder.model_name());
        store.add_batch(chunks, embeddings)?;
        store.save(&self.index_dir)?;

        tracing::info!(
            chunks = store.len(),
            dimension = store.dimension(),
            dir = %self.index_dir.display(),
            "index rebuilt"
        );
        Ok(BuildReport {
            documents: sources.len(),
            pages,
            characters,
            chunks: store.len(),
            dimension: store.dimension(),
            index_dir: self.index_dir.clone(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("no documents given")]
    NoDocuments,
    #[error("could not read {name}: {source}")]
    Extract { name: String, source: ExtractError },
    #[error("no extractable text in the given documents")]
    NoText,
    #[error("invalid chunking settings: {0}")]
    Chunking(#[from] ChunkError),
    #[error("embedding error: {0}")]
    Embed(#[from] ProviderError),
    #[error("index write error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::make_pdf;
    use crate::provider::fake::HashEmbedder;

    fn config(dir: &std::path::Path) -> Config {
        let mut c = Config::default().with_index_dir(dir.join("faiss_index"));
        c.chunking.max_chars = 40;
        c.chunking.overlap = 5;
        c
    }

    #[tokio::test]
    async fn builds_and_saves() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path());
        let indexer = Indexer::new(&cfg, Arc::new(HashEmbedder::new(32))).unwrap();
        let pdf = PdfSource::new("sky.pdf", make_pdf(&["The sky is blue. Grass is green and tall."]).unwrap());

        let report = indexer.build(&[pdf]).await.unwrap();
        assert_eq!(report.documents, 1);
        assert_eq!(report.pages, 1);
        assert!(report.chunks >= 2);
        assert_eq!(report.dimension, 32);

        let store = VectorStore::load(&cfg.index.dir).unwrap();
        assert_eq!(store.len(), report.chunks);
        assert!(store.chunks().all(|c| c.source == "sky.pdf"));
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let indexer = Indexer::new(&config(tmp.path()), Arc::new(HashEmbedder::default())).unwrap();
        assert!(matches!(indexer.build(&[]).await, Err(IndexError::NoDocuments)));
    }

    #[tokio::test]
    async fn bad_pdf_names_the_document() {
        let tmp = tempfile::tempdir().unwrap();
        let indexer = Indexer::new(&config(tmp.path()), Arc::new(HashEmbedder::default())).unwrap();
        let err = indexer
            .build(&[PdfSource::new("broken.pdf", b"%PDF-garbage".to_vec())])
            .await
            .unwrap_err();
        match err {
            IndexError::Extract { name, .. } => assert_eq!(name, "broken.pdf"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_chunking_is_rejected() {
        let mut c = Config::default();
        c.chunking.overlap = c.chunking.max_chars;
        assert!(matches!(
            Indexer::new(&c, Arc::new(HashEmbedder::default())),
            Err(IndexError::Chunking(_))
        ));
    }
}
