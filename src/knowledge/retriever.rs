//! Read-only document lookup for the answering pipelines.

use std::sync::Arc;

use super::corpus::quick_fact_documents;
use super::{Document, SearchHit, StoreError, VectorStore};
use crate::embedding::Embedder;

/// Snapshot of the knowledge base used to fetch context for a question.
///
/// Semantic search runs over the indexed documents. Keyword search runs
/// over a separate short corpus, the built-in quick facts by default.
pub struct Retriever {
    store: VectorStore,
    embedder: Arc<dyn Embedder>,
    keyword_corpus: Vec<Document>,
}

impl Retriever {
    pub fn new(store: VectorStore, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            keyword_corpus: quick_fact_documents(),
        }
    }

    /// Replaces the documents searched by `keyword_search`.
    #[must_use]
    pub fn with_keyword_corpus(mut self, corpus: Vec<Document>) -> Self {
        self.keyword_corpus = corpus;
        self
    }

    /// Embeds `query` and returns the `n` most similar documents.
    pub fn semantic_search(&self, query: &str, n: usize) -> Result<Vec<SearchHit>, StoreError> {
        if n == 0 || self.store.is_empty() {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed(query)?;
        self.store.query(&embedding, n)
    }

    /// Returns every keyword-corpus document containing any query word.
    ///
    /// Words are split on whitespace and matched case-insensitively as
    /// substrings; hits keep corpus order.
    pub fn keyword_search(&self, query: &str) -> Vec<SearchHit> {
        let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if words.is_empty() {
            return Vec::new();
        }

        self.keyword_corpus
            .iter()
            .filter_map(|doc| {
                let lower = doc.content.to_lowercase();
                let matched = words.iter().filter(|w| lower.contains(w.as_str())).count();
                (matched > 0).then(|| SearchHit {
                    id: doc.id.clone(),
                    content: doc.content.clone(),
                    score: matched as f32 / words.len() as f32,
                })
            })
            .collect()
    }

    /// Number of semantically indexed documents.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
