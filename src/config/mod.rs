//! Configuration management for pdfingest
//!
//! Handles loading and validating configuration from TOML files. Every
//! field has a default, so running without a config file is the norm.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data root and store locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Embedding backend configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Directory that relative paths resolve against (internal)
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Filesystem layout, relative to the base directory unless absolute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root containing one subdirectory of PDFs per ingestion set
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory owned by the local vector store
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap characters between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

/// Which embedding implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackendKind {
    #[default]
    Ollama,
    Fastembed,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: EmbeddingBackendKind,

    /// Model name/identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Base URL of the embedding server (ollama only)
    #[serde(default = "default_embedding_url")]
    pub url: String,

    /// Embedding dimension (must match model)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Batch size for embedding
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
}

/// Which vector store implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackendKind {
    #[default]
    Sqlite,
    Qdrant,
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackendKind,

    /// Qdrant connection URL
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,

    /// Qdrant collection name
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store_dir: default_store_dir(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackendKind::default(),
            model: default_embedding_model(),
            url: default_embedding_url(),
            dimension: default_embedding_dimension(),
            batch_size: default_embedding_batch_size(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackendKind::default(),
            qdrant_url: default_qdrant_url(),
            collection_name: default_collection_name(),
        }
    }
}

impl Config {
    /// Load configuration from a specific file path.
    ///
    /// The file's parent directory becomes the base directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.base_dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        config.validate()?;
        Ok(config)
    }

    /// Load `pdfingest.toml` from a base directory, falling back to defaults
    pub fn load_from(base_dir: PathBuf) -> Result<Self> {
        let config_file = base_dir.join(CONFIG_FILE_NAME);

        if config_file.exists() {
            return Self::load(&config_file);
        }

        debug!("No config file found in {:?}, using defaults", base_dir);
        let config = Config {
            base_dir,
            ..Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Root directory holding the PDF subdirectories
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join(&self.paths.data_dir)
    }

    /// Directory owned by the local vector store
    pub fn store_dir(&self) -> PathBuf {
        self.base_dir.join(&self.paths.store_dir)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk.chunk_size == 0 {
            return Err(Error::Config("chunk.chunk_size must be positive".to_string()));
        }

        if self.chunk.chunk_overlap >= self.chunk.chunk_size {
            return Err(Error::Config(
                "chunk.chunk_overlap must be < chunk.chunk_size".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(Error::Config(
                "embedding.batch_size must be positive".to_string(),
            ));
        }

        if self.embedding.dimension == 0 {
            return Err(Error::Config(
                "embedding.dimension must be positive".to_string(),
            ));
        }

        if self.embedding.backend == EmbeddingBackendKind::Ollama {
            Url::parse(&self.embedding.url)?;
        }

        if self.store.backend == StoreBackendKind::Qdrant {
            Url::parse(&self.store.qdrant_url)?;
            if self.store.collection_name.trim().is_empty() {
                return Err(Error::Config(
                    "store.collection_name must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}
