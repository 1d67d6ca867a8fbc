//! Offline feature-hashing embedder.

use super::{Embedder, EmbeddingError};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic bag-of-words embedder using the hashing trick.
///
/// Each lowercase alphanumeric token is hashed with FNV-1a into one of
/// `dimensions` buckets; one hash bit picks the sign. The vector is
/// L2-normalised, so cosine similarity reduces to token overlap and
/// synonyms score zero. It is a test double: fast, offline and
/// reproducible, but not selectable as a configured backend.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    model_id: String,
}

impl HashingEmbedder {
    /// Creates an embedder producing `dimensions`-long vectors.
    ///
    /// A dimension of zero is bumped to one.
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(1);
        Self {
            dimensions,
            model_id: format!("hashing-{dimensions}"),
        }
    }

    /// Returns the vector length.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl Default for HashingEmbedder {
    /// Same width as all-MiniLM-L6-v2.
    fn default() -> Self {
        Self::new(384)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in tokenize(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn vectors_have_requested_dimensions_and_unit_norm() {
        let embedder = HashingEmbedder::new(64);
        let v = embedder.embed("Austin real estate market").unwrap();
        assert_eq!(v.len(), 64);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn embedding_is_deterministic_and_case_insensitive() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("Swimming Pool").unwrap();
        let b = embedder.embed("swimming pool").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(16);
        let v = embedder.embed("   ...  ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn overlapping_texts_score_higher() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed("which property has a swimming pool").unwrap();
        let pool = embedder
            .embed("Stunning home with a resort-style swimming pool")
            .unwrap();
        let schools = embedder.embed("Highly rated schools nearby").unwrap();

        assert!(cosine(&query, &pool) > cosine(&query, &schools));
    }

    #[test]
    fn model_id_encodes_dimensions() {
        assert_eq!(HashingEmbedder::new(128).model_id(), "hashing-128");
        assert_eq!(HashingEmbedder::new(0).dimensions(), 1);
    }
}
