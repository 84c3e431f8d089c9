//! The two entry points front ends call: build the index from PDFs, and answer
//! a question from the index.

use std::sync::Arc;

use crate::answer::{Answer, Answerer};
use crate::config::Config;
use crate::error::Error;
use crate::extract::PdfSource;
use crate::index::{BuildReport, Indexer};
use crate::provider::{Embedder, GeminiClient, Generator};
use crate::retrieve::Retriever;

pub struct Pipeline {
    config: Config,
    indexer: Indexer,
    retriever: Retriever,
    answerer: Answerer,
}

impl Pipeline {
    /// Wire the pipeline with explicit providers. The same embedder serves both
    /// build and query so their vectors are comparable.
    pub fn new(config: Config, embedder: Arc<dyn Embedder>, generator: Arc<dyn Generator>) -> Result<Self, Error> {
        let indexer = Indexer::new(&config, embedder.clone())?;
        let retriever = Retriever::new(&config, embedder);
        let answerer = Answerer::from_config(&config, generator);
        Ok(Self {
            config,
            indexer,
            retriever,
            answerer,
        })
    }

    /// Production wiring: one [`GeminiClient`] for embeddings and generation.
    pub fn from_config(config: Config) -> Result<Self, Error> {
        let client = Arc::new(GeminiClient::new(&config).map_err(|e| Error::Configuration(e.to_string()))?);
        Self::new(config, client.clone(), client)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Submit & Process: rebuild the index from `sources`, discarding the old one.
    pub async fn process(&self, sources: &[PdfSource]) -> Result<BuildReport, Error> {
        tracing::info!(documents = sources.len(), "processing documents");
        Ok(self.indexer.build(sources).await?)
    }

    /// Answer `question` from the current index.
    pub async fn ask(&self, question: &str) -> Result<Answer, Error> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }
        let passages = self.retriever.retrieve(question).await?;
        let answer = self.answerer.answer(question, &passages).await?;
        tracing::info!(
            passages = passages.len(),
            unavailable = answer.is_unavailable(),
            "answered question"
        );
        Ok(answer)
    }
}
