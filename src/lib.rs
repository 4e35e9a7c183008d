//! # newsdigest
//!
//! Fetches recent web articles about a topic and asks a language model to
//! condense them into five bullet points.
//!
//! ## Pipeline
//!
//! - **Configuration**: provider, API key, model name, and topic gathered per run
//! - **Evidence retrieval**: up to five documents from a web search service
//! - **Prompt assembly**: a fixed instruction plus the document text
//! - **Summarization**: one chat call to OpenAI, Gemini, Anthropic, or Mistral

pub mod agent;
pub mod config;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod search;
pub mod summary;
pub mod ui;

pub use config::{resolve_credential, Config, Credential, RunConfig};
pub use pipeline::{DigestError, DigestPipeline, ErrorKind, RunState};
pub use provider::Provider;
pub use search::Document;
pub use summary::Summary;
