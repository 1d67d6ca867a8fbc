//! Client for a local Ollama embedding model.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Embedder, EmbeddingError};
use crate::llm::retry_with_backoff;

/// Ollama packaging of all-MiniLM-L6-v2.
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";

const DEFAULT_HOST: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

/// Builder for `OllamaEmbedder`.
#[derive(Debug, Default)]
pub struct OllamaEmbedderBuilder {
    base_url: Option<String>,
    model: Option<String>,
}

impl OllamaEmbedderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Ollama host (e.g., "http://localhost:11434").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the embedding model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds the embedder.
    ///
    /// Falls back to `OLLAMA_HOST` and `REALTOR_EMBEDDING_MODEL`, then to
    /// `http://localhost:11434` and `all-minilm`.
    pub fn build(self) -> Result<OllamaEmbedder, EmbeddingError> {
        let base_url = self
            .base_url
            .or_else(|| std::env::var("OLLAMA_HOST").ok())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();

        let model = self
            .model
            .or_else(|| std::env::var("REALTOR_EMBEDDING_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());

        reqwest::Url::parse(&base_url)
            .map_err(|e| EmbeddingError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(EmbeddingError::Network)?;

        Ok(OllamaEmbedder {
            client,
            base_url,
            model,
        })
    }
}

/// Embeds text through Ollama's `/api/embed` endpoint.
pub struct OllamaEmbedder {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    /// Returns the configured host.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/api/embed", self.base_url);
        let body = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        tracing::debug!(model = %self.model, inputs = texts.len(), "requesting embeddings");

        let embeddings = retry_with_backoff(|| {
            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .map_err(EmbeddingError::Network)?;

            let status = response.status();
            if !status.is_success() {
                return Err(EmbeddingError::Http {
                    status: status.as_u16(),
                });
            }

            let text = response.text().map_err(EmbeddingError::Network)?;
            let parsed: EmbedResponse =
                serde_json::from_str(&text).map_err(EmbeddingError::Serialization)?;
            Ok(parsed.embeddings)
        })?;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::Empty {
                expected: texts.len(),
                got: embeddings.len(),
            });
        }

        Ok(embeddings)
    }
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.request(&[text])?;
        vectors.pop().ok_or_else(|| EmbeddingError::Api {
            message: "no embedding returned".to_string(),
        })
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn build_uses_defaults() {
        unsafe {
            std::env::remove_var("OLLAMA_HOST");
            std::env::remove_var("REALTOR_EMBEDDING_MODEL");
        }

        let embedder = OllamaEmbedderBuilder::new().build().unwrap();
        assert_eq!(embedder.base_url(), "http://localhost:11434");
        assert_eq!(embedder.model_id(), DEFAULT_EMBEDDING_MODEL);
    }

    #[test]
    #[serial]
    fn build_reads_environment() {
        unsafe {
            std::env::set_var("OLLAMA_HOST", "http://gpu-box:11434/");
            std::env::set_var("REALTOR_EMBEDDING_MODEL", "nomic-embed-text");
        }

        let embedder = OllamaEmbedderBuilder::new().build().unwrap();
        assert_eq!(embedder.base_url(), "http://gpu-box:11434");
        assert_eq!(embedder.model_id(), "nomic-embed-text");

        unsafe {
            std::env::remove_var("OLLAMA_HOST");
            std::env::remove_var("REALTOR_EMBEDDING_MODEL");
        }
    }

    #[test]
    fn invalid_url_is_rejected() {
        let result = OllamaEmbedderBuilder::new().base_url("::nope::").build();
        assert!(matches!(result, Err(EmbeddingError::InvalidUrl(_))));
    }

    #[test]
    fn empty_batch_skips_the_network() {
        let embedder = OllamaEmbedderBuilder::new()
            .base_url("http://127.0.0.1:65535")
            .model("all-minilm")
            .build()
            .unwrap();
        assert!(embedder.embed_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn request_body_shape() {
        let texts = ["a", "b"];
        let body = EmbedRequest {
            model: "all-minilm",
            input: &texts,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "all-minilm");
        assert_eq!(value["input"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn response_parsing_tolerates_extra_fields() {
        let parsed: EmbedResponse = serde_json::from_str(
            r#"{"model": "all-minilm", "embeddings": [[0.1, 0.2]], "total_duration": 5}"#,
        )
        .unwrap();
        assert_eq!(parsed.embeddings, vec![vec![0.1, 0.2]]);
    }
}
