//! Grounded answers: put the retrieved passages and the question into a fixed
//! prompt and let the model answer from that context alone.
//!
//! The "not available" reply is a convention asked of the model in the prompt.
//! Nothing here checks that the answer really comes from the context.

use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::provider::{Generator, ProviderError};
use crate::store::ScoredChunk;

/// Reply the model is told to give when the context does not contain the answer.
pub const NOT_AVAILABLE: &str = "Answer is not available in the context";

/// Prompt sent for every question. `{context}` and `{question}` are filled in.
pub const PROMPT_TEMPLATE: &str = "Answer the question as detailed as possible from the provided context, \
make sure to provide all the details. If the answer is not in the provided context just say, \
\"Answer is not available in the context\", don't provide the wrong answer.\n\n\
Context:\n{context}\n\n\
Question:\n{question}\n\n\
Answer:\n";

/// A generated reply and the passages it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub passages: Vec<ScoredChunk>,
}

impl Answer {
    /// True when the model gave the "not available" reply.
    pub fn is_unavailable(&self) -> bool {
        self.text.contains(NOT_AVAILABLE)
    }
}

/// Fill the template. Passages are separated by blank lines, best match first.
pub fn build_prompt(question: &str, passages: &[ScoredChunk]) -> String {
    let context = passages
        .iter()
        .map(|p| p.chunk.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n");
    fill_template(PROMPT_TEMPLATE, &context, question.trim())
}

/// Substitutes both placeholders in one pass, so placeholder-like text inside
/// the passages is left alone.
fn fill_template(template: &str, context: &str, question: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len() + question.len());
    let mut rest = template;
    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("{context}") {
            out.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{question}") {
            out.push_str(question);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

pub struct Answerer {
    generator: Arc<dyn Generator>,
    temperature: f32,
}

impl Answerer {
    pub fn new(generator: Arc<dyn Generator>, temperature: f32) -> Self {
        Self {
            generator,
            temperature,
        }
    }

    pub fn from_config(config: &Config, generator: Arc<dyn Generator>) -> Self {
        Self::new(generator, config.gemini.temperature)
    }

    /// One model call; failures are returned as-is, never retried.
    pub async fn answer(&self, question: &str, passages: &[ScoredChunk]) -> Result<Answer, AnswerError> {
        let prompt = build_prompt(question, passages);
        tracing::debug!(
            model = self.generator.model_name(),
            passages = passages.len(),
            prompt_chars = prompt.chars().count(),
            "generating answer"
        );
        let text = self.generator.generate(&prompt, self.temperature).await?;
        Ok(Answer {
            text: text.trim().to_string(),
            passages: passages.to_vec(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("generation failed: {0}")]
    Generation(#[from] ProviderError),
}
