//! Retrieval-augmented answering over the knowledge base.
//!
//! `RagPipeline` fetches context (semantic or keyword), fills a prompt
//! template and asks the chat model for an answer.

mod pipeline;
mod types;

pub use pipeline::{RagError, RagPipeline};
pub use types::{RagAnswer, RetrievalMode, Source};
