//! Shared fixtures: offline providers.

#![allow(dead_code)]

use std::collections::HashSet;

use async_trait::async_trait;
use lectern_core::provider::{Embedder, Generator, ProviderError};
use lectern_core::NOT_AVAILABLE;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "did", "do", "does", "how", "in", "is", "of", "on", "the", "to", "was",
    "what", "when", "where", "which", "who", "why",
];

fn content_words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

fn section<'a>(prompt: &'a str, start: &str, end: &str) -> &'a str {
    let from = prompt.find(start).map(|i| i + start.len()).unwrap_or(0);
    let to = prompt[from..].find(end).map(|i| from + i).unwrap_or(prompt.len());
    &prompt[from..to]
}

/// Plays the model's side of the prompt contract: replies with the context
/// sentence sharing the most words with the question, or the "not available"
/// sentence when nothing matches.
pub struct ExtractiveGenerator;

#[async_trait]
impl Generator for ExtractiveGenerator {
    async fn generate(&self, prompt: &str, _temperature: f32) -> Result<String, ProviderError> {
        let context = section(prompt, "Context:\n", "\n\nQuestion:");
        let question = content_words(section(prompt, "Question:\n", "\n\nAnswer:"));
        let best = context
            .split(|c| c == '.' || c == '\n')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| (content_words(s).intersection(&question).count(), s))
            .filter(|(overlap, _)| *overlap > 0)
            .max_by_key(|(overlap, _)| *overlap);
        Ok(match best {
            Some((_, sentence)) => format!("{sentence}."),
            None => NOT_AVAILABLE.to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "test/extractive"
    }
}

/// Embedding service that is always down.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed_documents(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Err(ProviderError::Api {
            status: 503,
            message: "service unavailable".to_string(),
        })
    }

    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
        Err(ProviderError::Api {
            status: 503,
            message: "service unavailable".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        lectern_core::provider::fake::HASH_EMBEDDER_MODEL
    }
}
