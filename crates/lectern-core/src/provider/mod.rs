//! Capabilities the pipeline needs from a model service: turning text into
//! vectors and turning a prompt into text.
//!
//! [`GeminiClient`] is the production adapter; [`fake`] has deterministic
//! stand-ins that never touch the network.

pub mod fake;
pub mod gemini;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiClient;

/// Text → embedding vector.
///
/// The same text embedded twice with the same model must give the same vector,
/// and query vectors must be comparable with document vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed document chunks. Returns one vector per input, in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    /// Embed a search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Identifier stored alongside the index, e.g. `models/embedding-001`.
    fn model_name(&self) -> &str;
}

/// Prompt → generated text.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, ProviderError>;

    fn model_name(&self) -> &str;
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no API key configured (set GOOGLE_API_KEY)")]
    MissingApiKey,
    #[error("invalid service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response: {0}")]
    MalformedResponse(String),
}
