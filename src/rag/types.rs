//! Types for retrieval-augmented answers.

use serde::Serialize;

/// How context documents were selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    /// Nearest neighbours of the question embedding.
    Semantic,
    /// Documents sharing a word with the question.
    Keyword,
}

impl RetrievalMode {
    /// Parse from string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "semantic" => Some(Self::Semantic),
            "keyword" => Some(Self::Keyword),
            _ => None,
        }
    }
}

impl std::fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Semantic => write!(f, "semantic"),
            Self::Keyword => write!(f, "keyword"),
        }
    }
}

/// A document that was placed in the prompt context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub id: String,
    pub score: f32,
}

/// An answer together with the documents it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub question: String,
    pub answer: String,
    pub sources: Vec<Source>,
    pub mode: RetrievalMode,
}

impl RagAnswer {
    /// Ids of the context documents, in prompt order.
    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.id.as_str()).collect()
    }

    /// Returns true if any context was retrieved.
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }
}
