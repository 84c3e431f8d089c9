//! Query side: load the saved index and find the chunks closest to a question.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::provider::{Embedder, ProviderError};
use crate::store::{ScoredChunk, StoreError, VectorStore};

pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index_dir: PathBuf,
    top_k: usize,
}

impl Retriever {
    pub fn new(config: &Config, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            index_dir: config.index.dir.clone(),
            top_k: config.retrieval.top_k.max(1),
        }
    }

    /// Top-k chunks for `query`, using the configured k.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>, RetrieveError> {
        self.retrieve_k(query, self.top_k).await
    }

    /// Top-k chunks for `query`. `k` below 1 is treated as 1.
    ///
    /// The index is loaded before the query is embedded, so a missing index is
    /// reported without any model call.
    pub async fn retrieve_k(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, RetrieveError> {
        let store = VectorStore::load(&self.index_dir).map_err(|e| match e {
            StoreError::NotFound(dir) => RetrieveError::IndexNotFound(dir),
            other => RetrieveError::Store(other),
        })?;
        if store.model() != self.embedder.model_name() {
            return Err(RetrieveError::ModelMismatch {
                index: store.model().to_string(),
                query: self.embedder.model_name().to_string(),
            });
        }

        let query_embedding = self.embedder.embed_query(query).await?;
        if query_embedding.len() != store.dimension() {
            return Err(RetrieveError::DimensionMismatch {
                expected: store.dimension(),
                actual: query_embedding.len(),
            });
        }
        let hits = store.search(&query_embedding, k.max(1));
        tracing::debug!(hits = hits.len(), k, "retrieved chunks");
        Ok(hits)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetrieveError {
    #[error("no index found at {}; process some PDFs first", .0.display())]
    IndexNotFound(PathBuf),
    #[error("index was built with {index} but queries use {query}; rebuild the index")]
    ModelMismatch { index: String, query: String },
    #[error("query embedding has {actual} dimensions, index uses {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("embedding error: {0}")]
    Embed(#[from] ProviderError),
    #[error("index read error: {0}")]
    Store(StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::Chunk;
    use crate::provider::fake::HashEmbedder;

    fn save_index(dir: &std::path::Path, embedder: &HashEmbedder, texts: &[&str]) {
        let mut store = VectorStore::new(embedder.model_name());
        for (i, t) in texts.iter().enumerate() {
            let chunk = Chunk {
                text: t.to_string(),
                source: "doc.pdf".to_string(),
                index: i,
            };
            store.add(chunk, embedder.vector(t)).unwrap();
        }
        store.save(dir).unwrap();
    }

    #[tokio::test]
    async fn missing_index_is_an_error_not_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::default().with_index_dir(tmp.path().join("faiss_index"));
        let embedder = Arc::new(HashEmbedder::default());
        let retriever = Retriever::new(&cfg, embedder.clone());

        let err = retriever.retrieve("anything").await.unwrap_err();
        assert!(matches!(err, RetrieveError::IndexNotFound(_)));
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn returns_closest_chunks_first() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("faiss_index");
        let embedder = Arc::new(HashEmbedder::default());
        save_index(
            &dir,
            &embedder,
            &["The sky is blue.", "Rust has ownership.", "Cats chase mice."],
        );
        let retriever = Retriever::new(&Config::default().with_index_dir(&dir), embedder);

        let hits = retriever.retrieve_k("what colour is the sky", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "The sky is blue.");

        assert_eq!(retriever.retrieve_k("sky", 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn model_mismatch_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("faiss_index");
        let mut store = VectorStore::new("models/embedding-001");
        store
            .add(
                Chunk {
                    text: "x".into(),
                    source: "d".into(),
                    index: 0,
                },
                vec![1.0],
            )
            .unwrap();
        store.save(&dir).unwrap();

        let retriever = Retriever::new(
            &Config::default().with_index_dir(&dir),
            Arc::new(HashEmbedder::default()),
        );
        assert!(matches!(
            retriever.retrieve("x").await,
            Err(RetrieveError::ModelMismatch { .. })
        ));
    }
}
