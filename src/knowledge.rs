//! The real-estate knowledge base: built-in corpus, similarity index,
//! SQLite persistence and the read-only retriever used by the query path.

pub mod corpus;
mod base;
mod retriever;
mod store;

use serde::Serialize;
use thiserror::Error;

use crate::embedding::EmbeddingError;

pub use base::KnowledgeBase;
pub use retriever::Retriever;
pub use store::VectorStore;

/// A stored text document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: String,
    pub content: String,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// A retrieved document with its relevance score.
///
/// Semantic hits carry cosine similarity; keyword hits carry the fraction
/// of query words found in the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub content: String,
    pub score: f32,
}

/// Errors raised by the knowledge base and its index.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document id '{0}' already exists")]
    DuplicateId(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Document content cannot be empty")]
    EmptyDocument,

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}
