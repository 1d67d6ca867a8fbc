//! Text embedding backends.
//!
//! Embeddings are produced by an external model; this module only defines
//! the `Embedder` seam plus its implementations: all-MiniLM-L6-v2 run
//! in-process through fastembed, a client for an Ollama embedding server,
//! and a feature-hashing test double.

mod hashing;
mod local;
mod ollama;

use thiserror::Error;

use crate::llm::Transient;

pub use hashing::HashingEmbedder;
pub use local::{
    LOCAL_EMBEDDING_DIMENSIONS, LOCAL_EMBEDDING_MODEL, LocalEmbedder, LocalEmbedderBuilder,
};
pub use ollama::{DEFAULT_EMBEDDING_MODEL, OllamaEmbedder, OllamaEmbedderBuilder};

/// Errors that can occur while producing embeddings.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Network-related errors (connection refused, DNS, timeouts)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// The embedding server returned an unusable payload
    #[error("Embedding API error: {message}")]
    Api { message: String },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The in-process model failed to load or run
    #[error("Local embedding model error: {0}")]
    Model(String),

    /// The server answered with fewer vectors than texts
    #[error("Embedding server returned {got} vectors for {expected} inputs")]
    Empty { expected: usize, got: usize },
}

impl Transient for EmbeddingError {
    fn is_transient(&self) -> bool {
        match self {
            EmbeddingError::Network(_) => true,
            EmbeddingError::Http { status } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

/// Produces fixed-length vectors for text.
///
/// Implementations must be deterministic for a given `model_id`, since
/// stored vectors are only reused when the model id matches.
pub trait Embedder: Send + Sync {
    /// Embeds a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embeds several texts, preserving order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Identifies the model producing the vectors (stored alongside them).
    fn model_id(&self) -> &str;
}
