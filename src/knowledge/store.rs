//! Brute-force cosine similarity index.

use super::{Document, SearchHit, StoreError};

#[derive(Clone)]
struct Entry {
    id: String,
    content: String,
    embedding: Vec<f32>,
    norm: f32,
}

/// In-memory vector index with unique string ids.
///
/// Entries keep insertion order, which breaks score ties in `query`.
#[derive(Default, Clone)]
pub struct VectorStore {
    entries: Vec<Entry>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimension of stored vectors, or `None` while empty.
    pub fn dimensions(&self) -> Option<usize> {
        self.entries.first().map(|e| e.embedding.len())
    }

    /// Adds a document and its embedding.
    ///
    /// # Errors
    ///
    /// `DuplicateId` if `id` is already present, `DimensionMismatch` if the
    /// vector length differs from the stored vectors.
    pub fn add(
        &mut self,
        id: impl Into<String>,
        content: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Result<(), StoreError> {
        let id = id.into();
        if self.contains(&id) {
            return Err(StoreError::DuplicateId(id));
        }
        self.check_dimensions(embedding.len())?;

        let norm = l2_norm(&embedding);
        self.entries.push(Entry {
            id,
            content: content.into(),
            embedding,
            norm,
        });
        Ok(())
    }

    /// Returns up to `n` hits ordered by descending cosine similarity.
    pub fn query(&self, embedding: &[f32], n: usize) -> Result<Vec<SearchHit>, StoreError> {
        if n == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }
        self.check_dimensions(embedding.len())?;

        let query_norm = l2_norm(embedding);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine(embedding, query_norm, &entry.embedding, entry.norm)))
            .collect();

        // Stable sort keeps insertion order for equal scores
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(n)
            .map(|(i, score)| {
                let entry = &self.entries[i];
                SearchHit {
                    id: entry.id.clone(),
                    content: entry.content.clone(),
                    score,
                }
            })
            .collect())
    }

    /// Removes a document. Returns whether it existed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn get(&self, id: &str) -> Option<Document> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| Document::new(e.id.clone(), e.content.clone()))
    }

    /// All documents in insertion order.
    pub fn documents(&self) -> Vec<Document> {
        self.entries
            .iter()
            .map(|e| Document::new(e.id.clone(), e.content.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_dimensions(&self, got: usize) -> Result<(), StoreError> {
        match self.dimensions() {
            Some(expected) if expected != got => Err(StoreError::DimensionMismatch { expected, got }),
            _ => Ok(()),
        }
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (a_norm * b_norm)
}
