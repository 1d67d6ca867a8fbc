//! Runtime configuration read from the environment.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::embedding::{
    DEFAULT_EMBEDDING_MODEL, Embedder, LocalEmbedderBuilder, OllamaEmbedderBuilder,
};
use crate::llm::{ChatClient, ChatClientBuilder};
use crate::utils::get_database_path;

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedderKind {
    /// all-MiniLM-L6-v2 run in-process through fastembed.
    Local,
    /// Local Ollama server running a sentence-embedding model.
    Ollama,
}

impl std::str::FromStr for EmbedderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "fastembed" => Ok(Self::Local),
            "ollama" => Ok(Self::Ollama),
            other => bail!("Unknown REALTOR_EMBEDDER value '{other}' (expected local or ollama)"),
        }
    }
}

impl std::fmt::Display for EmbedderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

/// Settings resolved from `.env` and the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub embedder: EmbedderKind,
    pub ollama_host: Option<String>,
    pub embedding_model: String,
    pub database_path: PathBuf,
    /// Where the local embedding model is downloaded to.
    pub model_cache_dir: PathBuf,
}

impl Config {
    /// Loads `.env` (if present) and reads every setting.
    pub fn load() -> Result<Self> {
        // A missing .env is normal
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    /// Reads every setting from the process environment, applying defaults.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown `REALTOR_EMBEDDER` value or when no
    /// data directory exists and `REALTOR_DB` is unset.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let embedder = match var("REALTOR_EMBEDDER") {
            Some(value) => value.parse()?,
            None => EmbedderKind::Local,
        };

        let database_path = match var("REALTOR_DB") {
            Some(path) => PathBuf::from(path),
            None => get_database_path()?,
        };

        let model_cache_dir = match var("REALTOR_MODEL_CACHE") {
            Some(path) => PathBuf::from(path),
            None => model_cache_beside(&database_path),
        };

        Ok(Self {
            api_key: var("DEEPSEEK_API_KEY"),
            base_url: var("DEEPSEEK_BASE_URL"),
            model: var("DEEPSEEK_MODEL"),
            embedder,
            ollama_host: var("OLLAMA_HOST"),
            embedding_model: var("REALTOR_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            database_path,
            model_cache_dir,
        })
    }

    /// Builds the chat client described by this configuration.
    pub fn chat_client(&self) -> Result<ChatClient> {
        let mut builder = ChatClientBuilder::new();
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url);
        }
        if let Some(key) = &self.api_key {
            builder = builder.api_key(key);
        }
        if let Some(model) = &self.model {
            builder = builder.model(model);
        }
        builder.build().context("Failed to create chat client")
    }

    /// Builds the configured embedder.
    pub fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        match self.embedder {
            EmbedderKind::Local => {
                let embedder = LocalEmbedderBuilder::new()
                    .cache_dir(&self.model_cache_dir)
                    .build()
                    .context("Failed to load local embedding model")?;
                Ok(Arc::new(embedder))
            }
            EmbedderKind::Ollama => {
                let mut builder = OllamaEmbedderBuilder::new().model(&self.embedding_model);
                if let Some(host) = &self.ollama_host {
                    builder = builder.base_url(host);
                }
                let embedder = builder.build().context("Failed to create embedder")?;
                Ok(Arc::new(embedder))
            }
        }
    }
}

/// `models/` next to the database file.
fn model_cache_beside(database_path: &Path) -> PathBuf {
    database_path
        .parent()
        .map(|dir| dir.join("models"))
        .unwrap_or_else(|| PathBuf::from("models"))
}
