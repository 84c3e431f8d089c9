//! User-facing error taxonomy. Every variant is shown to the user as-is; none is retried.

use std::path::PathBuf;

use thiserror::Error;

use crate::answer::AnswerError;
use crate::extract::ExtractError;
use crate::index::IndexError;
use crate::provider::ProviderError;
use crate::retrieve::RetrieveError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not read {name}: {source}")]
    Extraction { name: String, source: ExtractError },
    #[error("failed to build index: {0}")]
    IndexBuild(IndexError),
    #[error("no index found at {}; process some PDFs first", .0.display())]
    IndexNotFound(PathBuf),
    #[error("failed to search index: {0}")]
    Retrieval(RetrieveError),
    #[error("failed to generate answer: {0}")]
    AnswerGeneration(ProviderError),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("no PDF documents were provided")]
    NoDocuments,
    #[error("question is empty")]
    EmptyQuestion,
}

impl Error {
    /// Stable machine-readable name, used by the HTTP front end.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Extraction { .. } => "extraction",
            Error::IndexBuild(_) => "index_build",
            Error::IndexNotFound(_) => "index_not_found",
            Error::Retrieval(_) => "retrieval",
            Error::AnswerGeneration(_) => "answer_generation",
            Error::Configuration(_) => "configuration",
            Error::NoDocuments | Error::EmptyQuestion => "invalid_input",
        }
    }
}

impl From<IndexError> for Error {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::NoDocuments => Error::NoDocuments,
            IndexError::Extract { name, source } => Error::Extraction { name, source },
            IndexError::Chunking(e) => Error::Configuration(e.to_string()),
            IndexError::Embed(ProviderError::MissingApiKey) => {
                Error::Configuration(ProviderError::MissingApiKey.to_string())
            }
            other => Error::IndexBuild(other),
        }
    }
}

impl From<RetrieveError> for Error {
    fn from(e: RetrieveError) -> Self {
        match e {
            RetrieveError::IndexNotFound(dir) => Error::IndexNotFound(dir),
            RetrieveError::Embed(ProviderError::MissingApiKey) => {
                Error::Configuration(ProviderError::MissingApiKey.to_string())
            }
            other => Error::Retrieval(other),
        }
    }
}

impl From<AnswerError> for Error {
    fn from(e: AnswerError) -> Self {
        match e {
            AnswerError::Generation(ProviderError::MissingApiKey) => {
                Error::Configuration(ProviderError::MissingApiKey.to_string())
            }
            AnswerError::Generation(other) => Error::AnswerGeneration(other),
        }
    }
}
