
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Environment variable holding the inference API token. The token is read
/// from the environment at client construction and never written to disk.
pub const API_TOKEN_ENV: &str = "HUGGINGFACE_API_KEY";

pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 384;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub api_base: String,
    pub embedding_provider: EmbeddingProvider,
    pub embedding_model: String,
    pub embedding_dimension: u32,
    pub generation_model: String,
    pub summarization_model: String,
    pub batch_size: u32,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Hosted inference API (network access and usually a token required).
    Remote,
    /// Deterministic local character n-gram embedder, usable offline.
    Builtin,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory of PDF documents for the offline index build. A relative
    /// path is resolved against the application base directory.
    pub corpus_dir: PathBuf,
    /// Summarize each chunk through the summarization model during the
    /// offline build. Off by default since it multiplies service calls.
    pub summarize_chunks: bool,
    pub summary_max_length: u32,
    pub summary_min_length: u32,
    /// Number of nearest chunks retrieved as answer context.
    pub top_k: usize,
}

impl Default for ServiceConfig {
    #[inline]
    fn default() -> Self {
        Self {
            api_base: "https://api-inference.huggingface.co".to_string(),
            embedding_provider: EmbeddingProvider::Remote,
            embedding_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            generation_model: "mistralai/Mistral-7B-Instruct-v0.1".to_string(),
            summarization_model: "google/flan-t5-large".to_string(),
            batch_size: 16,
            timeout_seconds: 30,
        }
    }
}

impl Default for IndexConfig {
    #[inline]
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("corpus"),
            summarize_chunks: false,
            summary_max_length: 130,
            summary_min_length: 30,
            top_k: 3,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid embedding dimension: {0} (must be between 64 and 4096)")]
    InvalidEmbeddingDimension(u32),
    #[error("Invalid timeout: {0} (must be between 1 and 300 seconds)")]
    InvalidTimeout(u64),
    #[error("Invalid top-k: {0} (must be between 1 and 50)")]
    InvalidTopK(usize),
    #[error("Summary max length ({0}) must be greater than min length ({1})")]
    SummaryLengthsInverted(u32, u32),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                service: ServiceConfig::default(),
                index: IndexConfig::default(),
                base_dir: config_dir.as_ref().to_path_buf(),
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    /// Load from the platform configuration directory.
    #[inline]
    pub fn load_default() -> Result<Self> {
        let config_dir = super::get_config_dir()?;
        Self::load(config_dir)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        fs::create_dir_all(&self.base_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                self.base_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.service.validate()?;

        if !(1..=50).contains(&self.index.top_k) {
            return Err(ConfigError::InvalidTopK(self.index.top_k));
        }
        if self.index.summary_max_length <= self.index.summary_min_length {
            return Err(ConfigError::SummaryLengthsInverted(
                self.index.summary_max_length,
                self.index.summary_min_length,
            ));
        }

        Ok(())
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.base_dir.join("config.toml")
    }

    /// Path of the persisted base vector index blob.
    #[inline]
    pub fn index_path(&self) -> PathBuf {
        self.base_dir.join("base_index.bin")
    }

    /// Path of the sentence store paired with the base index.
    #[inline]
    pub fn sentences_path(&self) -> PathBuf {
        self.base_dir.join("base_sentences.json")
    }

    /// Path of the SQLite chat history database.
    #[inline]
    pub fn history_db_path(&self) -> PathBuf {
        self.base_dir.join("chat_history.db")
    }

    /// Corpus directory for the offline build, resolved against `base_dir`
    /// when configured relative.
    #[inline]
    pub fn corpus_dir_path(&self) -> PathBuf {
        if self.index.corpus_dir.is_absolute() {
            self.index.corpus_dir.clone()
        } else {
            self.base_dir.join(&self.index.corpus_dir)
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api_base_url()?;

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }
        if self.generation_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.generation_model.clone()));
        }
        if self.summarization_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.summarization_model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if !(64..=4096).contains(&self.embedding_dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.embedding_dimension,
            ));
        }

        if !(1..=300).contains(&self.timeout_seconds) {
            return Err(ConfigError::InvalidTimeout(self.timeout_seconds));
        }

        Ok(())
    }

    pub fn api_base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.api_base).map_err(|_| ConfigError::InvalidUrl(self.api_base.clone()))
    }
}

/// Read the inference API token from the environment, if set.
#[inline]
pub fn api_token() -> Option<String> {
    std::env::var(API_TOKEN_ENV)
        .ok()
        .filter(|token| !token.trim().is_empty())
}
