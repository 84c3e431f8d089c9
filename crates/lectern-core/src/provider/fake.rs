//! Deterministic providers for tests and local wiring checks. No network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Embedder, Generator, ProviderError};

pub const HASH_EMBEDDER_MODEL: &str = "fake/hash-embedder";
const DEFAULT_DIMENSION: usize = 256;

/// Hashed bag-of-words embeddings: each lowercase word bumps one signed bucket.
///
/// Texts sharing words get similar vectors, which is enough to exercise ranking.
#[derive(Debug)]
pub struct HashEmbedder {
    dimension: usize,
    calls: AtomicUsize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of embed calls made so far (documents and queries).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let h = fnv1a(&word.to_lowercase());
            let bucket = (h % self.dimension as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        v
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector(text))
    }

    fn model_name(&self) -> &str {
        HASH_EMBEDDER_MODEL
    }
}

/// Always replies with the same text; remembers every prompt it was given.
#[derive(Debug)]
pub struct StaticGenerator {
    reply: String,
    prompts: Mutex<Vec<(String, f32)>>,
}

impl StaticGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, with the temperature each was sent at.
    pub fn prompts(&self) -> Vec<(String, f32)> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Generator for StaticGenerator {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, ProviderError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((prompt.to_string(), temperature));
        }
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "fake/static-generator"
    }
}
