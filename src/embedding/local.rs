//! In-process sentence embeddings through fastembed (ONNX runtime).

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::{Embedder, EmbeddingError};

/// Model id stored next to vectors produced by `LocalEmbedder`.
pub const LOCAL_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";

/// Output width of all-MiniLM-L6-v2.
pub const LOCAL_EMBEDDING_DIMENSIONS: usize = 384;

/// Builder for `LocalEmbedder`.
#[derive(Debug, Default)]
pub struct LocalEmbedderBuilder {
    cache_dir: Option<PathBuf>,
    show_download_progress: bool,
}

impl LocalEmbedderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory the ONNX model files are downloaded to and loaded from.
    pub fn cache_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cache_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Prints a progress bar while the model downloads on first use.
    pub fn show_download_progress(mut self, show: bool) -> Self {
        self.show_download_progress = show;
        self
    }

    /// Loads all-MiniLM-L6-v2, downloading it into the cache on first use.
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::Model` if the model cannot be fetched or the
    /// ONNX session fails to start.
    pub fn build(self) -> Result<LocalEmbedder, EmbeddingError> {
        let mut options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(self.show_download_progress);
        if let Some(dir) = &self.cache_dir {
            options = options.with_cache_dir(dir.clone());
        }

        tracing::debug!(cache_dir = ?self.cache_dir, "loading local embedding model");
        let model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::Model(format!("{e:#}")))?;

        Ok(LocalEmbedder {
            model: Mutex::new(model),
            cache_dir: self.cache_dir,
        })
    }
}

/// Runs all-MiniLM-L6-v2 in-process; no server is needed once the model is
/// cached.
pub struct LocalEmbedder {
    model: Mutex<TextEmbedding>,
    cache_dir: Option<PathBuf>,
}

impl LocalEmbedder {
    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }
}

impl Embedder for LocalEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text])?;
        vectors.pop().ok_or_else(|| EmbeddingError::Api {
            message: "no embedding returned".to_string(),
        })
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self
            .model
            .lock()
            .map_err(|_| EmbeddingError::Model("embedding model lock poisoned".to_string()))?
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::Model(format!("{e:#}")))?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::Empty {
                expected: texts.len(),
                got: vectors.len(),
            });
        }
        Ok(vectors)
    }

    fn model_id(&self) -> &str {
        LOCAL_EMBEDDING_MODEL
    }
}
