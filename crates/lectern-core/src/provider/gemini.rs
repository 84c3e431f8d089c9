//! Gemini REST client for embeddings and answer generation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{Embedder, Generator, ProviderError};
use crate::config::Config;

/// Most texts the service accepts in one `batchEmbedContents` call.
const MAX_BATCH: usize = 100;

const TASK_DOCUMENT: &str = "RETRIEVAL_DOCUMENT";
const TASK_QUERY: &str = "RETRIEVAL_QUERY";

/// Thin wrapper around the Gemini `v1beta` endpoints.
///
/// Can be built without an API key; the first call then fails with
/// [`ProviderError::MissingApiKey`].
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
    embed_model: String,
    chat_model: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let mut base = config.gemini.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let mut builder = Client::builder();
        if let Some(secs) = config.gemini.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            embed_model: model_path(&config.gemini.embed_model),
            chat_model: model_path(&config.gemini.chat_model),
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> Result<Url, ProviderError> {
        let key = self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)?;
        let mut url = self.base_url.join(&format!("v1beta/{model}:{method}"))?;
        url.query_pairs_mut().append_pair("key", key);
        Ok(url)
    }

    async fn post<B, R>(&self, url: Url, body: &B) -> Result<R, ProviderError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        // Strip the URL from transport errors: it carries the key.
        let res = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.without_url()))?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }
        res.json::<R>()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.without_url().to_string()))
    }

    fn embed_request<'a>(&'a self, text: &'a str, task_type: &'static str) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: &self.embed_model,
            content: Content::user_text(text),
            task_type,
        }
    }
}

/// Accepts `embedding-001` as well as `models/embedding-001`.
fn model_path(name: &str) -> String {
    if name.starts_with("models/") || name.starts_with("tunedModels/") {
        name.to_string()
    } else {
        format!("models/{name}")
    }
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl Embedder for GeminiClient {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.endpoint(&self.embed_model, "batchEmbedContents")?;
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            let req = BatchEmbedRequest {
                requests: batch
                    .iter()
                    .map(|t| self.embed_request(t, TASK_DOCUMENT))
                    .collect(),
            };
            let res: BatchEmbedResponse = self.post(url.clone(), &req).await?;
            if res.embeddings.len() != batch.len() {
                return Err(ProviderError::MalformedResponse(format!(
                    "asked for {} embeddings, got {}",
                    batch.len(),
                    res.embeddings.len()
                )));
            }
            tracing::debug!(count = batch.len(), "embedded batch");
            vectors.extend(res.embeddings.into_iter().map(|e| e.values));
        }
        Ok(vectors)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let url = self.endpoint(&self.embed_model, "embedContent")?;
        let res: EmbedContentResponse = self.post(url, &self.embed_request(text, TASK_QUERY)).await?;
        Ok(res.embedding.values)
    }

    fn model_name(&self) -> &str {
        &self.embed_model
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, ProviderError> {
        let url = self.endpoint(&self.chat_model, "generateContent")?;
        let req = GenerateRequest {
            contents: vec![Content::user_text(prompt)],
            generation_config: GenerationConfig { temperature },
        };
        let res: GenerateResponse = self.post(url, &req).await?;
        res.into_text()
    }

    fn model_name(&self) -> &str {
        &self.chat_model
    }
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn user_text(text: &'a str) -> Self {
        Self {
            role: "user",
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, parts joined.
    fn into_text(self) -> Result<String, ProviderError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "none given".to_string());
            return Err(ProviderError::MalformedResponse(format!(
                "no candidates returned (block reason: {reason})"
            )));
        };
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
            return Err(ProviderError::MalformedResponse(format!(
                "empty candidate (finish reason: {reason})"
            )));
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
