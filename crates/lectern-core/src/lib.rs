//! All backend logic independent of how Lectern is run (CLI, chat shell or HTTP).
//!
//! Build phase: [extract] → [chunks] → [index] (embeds through [provider], saves a [store]).
//! Query phase: [retrieve] → [answer]. [pipeline] ties both phases to one [Config].

pub mod answer;
pub mod app_data;
pub mod chunks;
pub mod config;
pub mod error;
pub mod extract;
pub mod index;
pub mod logging;
pub mod pipeline;
pub mod provider;
pub mod retrieve;
pub mod store;
#[doc(hidden)]
pub mod testing;

pub use answer::{build_prompt, Answer, Answerer, NOT_AVAILABLE};
pub use app_data::app_data_dir;
pub use chunks::{chunk_document, chunk_documents, Chunk, TextSplitter, DEFAULT_MAX_CHARS, DEFAULT_OVERLAP};
pub use config::{load_config, save_config, Config, ConfigError};
pub use error::Error;
pub use extract::{collect_pdfs, extract_document, PdfSource, ScanError};
pub use index::{BuildReport, Indexer};
pub use pipeline::Pipeline;
pub use provider::{Embedder, GeminiClient, Generator, ProviderError};
pub use retrieve::Retriever;
pub use store::{ScoredChunk, VectorStore};

/// Returns a short status string. Used to verify the backend is wired up.
pub fn status() -> &'static str {
    "lectern-core ready"
}
