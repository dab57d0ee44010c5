//! Embedding generation
//!
//! This module provides an abstraction over embedding models with:
//! - A trait for different embedding backends
//! - Ollama HTTP backend and optional local FastEmbed backend
//! - Batch processing for efficiency

#[cfg(feature = "local-embed")]
mod fastembed_impl;
mod ollama;

#[cfg(feature = "local-embed")]
pub use fastembed_impl::*;
pub use ollama::*;

use crate::config::{EmbeddingBackendKind, EmbeddingConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use indicatif::ProgressBar;
use tokio::sync::OnceCell;
use tracing::debug;

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create an embedder based on configuration
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.backend {
        EmbeddingBackendKind::Ollama => Ok(Box::new(OllamaEmbedder::new(config)?)),
        #[cfg(feature = "local-embed")]
        EmbeddingBackendKind::Fastembed => Ok(Box::new(FastEmbedder::new(config)?)),
        #[cfg(not(feature = "local-embed"))]
        EmbeddingBackendKind::Fastembed => Err(Error::Config(
            "embedding backend 'fastembed' requires the local-embed feature".to_string(),
        )),
    }
}

/// Embedder built from configuration on first use, so runs that embed
/// nothing never load a model or open a client
pub struct LazyEmbedder {
    config: EmbeddingConfig,
    inner: OnceCell<Box<dyn Embedder>>,
}

impl LazyEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            config: config.clone(),
            inner: OnceCell::new(),
        }
    }

    /// Whether the backing embedder has been built
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized()
    }

    async fn get(&self) -> Result<&dyn Embedder> {
        let embedder = self
            .inner
            .get_or_try_init(|| async {
                debug!("Creating {:?} embedder", self.config.backend);
                create_embedder(&self.config)
            })
            .await?;
        Ok(embedder.as_ref())
    }
}

#[async_trait]
impl Embedder for LazyEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.get().await?.embed(texts).await
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Helper to embed in batches, advancing `progress` per text
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: Vec<String>,
    batch_size: usize,
    progress: Option<&ProgressBar>,
) -> Result<Vec<Vec<f32>>> {
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(batch_size.max(1)) {
        let batch_texts: Vec<String> = chunk.to_vec();
        let embeddings = embedder.embed(batch_texts).await?;

        if embeddings.len() != chunk.len() {
            return Err(Error::Embedding(format!(
                "Model '{}' returned {} embeddings for {} inputs",
                embedder.model_name(),
                embeddings.len(),
                chunk.len()
            )));
        }

        all_embeddings.extend(embeddings);
        if let Some(pb) = progress {
            pb.inc(chunk.len() as u64);
        }
    }

    Ok(all_embeddings)
}
