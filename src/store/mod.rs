//! Vector store access
//!
//! This module hides the vector database behind two small traits:
//! - [`VectorStore`]: existence queries, batched inserts and flush
//! - [`StoreFactory`]: opening a fresh handle and destroying the store
//!
//! Backends are a local SQLite file (default) and Qdrant.

mod payload;
mod qdrant;
mod sqlite;

pub use payload::*;
pub use qdrant::*;
pub use sqlite::*;

use crate::chunk::ChunkId;
use crate::config::{Config, StoreBackendKind, StoreConfig};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

/// Trait for vector store backends
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Every chunk ID currently persisted
    async fn all_ids(&self) -> Result<HashSet<ChunkId>>;

    /// The subset of `candidates` already persisted.
    ///
    /// The default materializes [`VectorStore::all_ids`] and intersects in
    /// memory; backends with indexed lookup override it.
    async fn existing_ids(&self, candidates: &[ChunkId]) -> Result<HashSet<ChunkId>> {
        let all = self.all_ids().await?;
        Ok(candidates
            .iter()
            .filter(|id| all.contains(*id))
            .cloned()
            .collect())
    }

    /// Insert records keyed by their chunk IDs
    async fn add_chunks(&self, records: Vec<ChunkRecord>) -> Result<()>;

    /// Flush pending writes to durable storage
    async fn persist(&self) -> Result<()>;
}

/// Opens store handles and destroys the persisted store
#[async_trait]
pub trait StoreFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn VectorStore>>;

    /// Irreversibly delete all persisted data
    async fn reset(&self) -> Result<()>;
}

/// [`StoreFactory`] driven by configuration
#[derive(Debug, Clone)]
pub struct ConfiguredStore {
    store: StoreConfig,
    store_dir: PathBuf,
    dimension: usize,
}

impl ConfiguredStore {
    pub fn new(config: &Config) -> Self {
        Self {
            store: config.store.clone(),
            store_dir: config.store_dir(),
            dimension: config.embedding.dimension,
        }
    }

    fn qdrant(&self) -> Result<QdrantStore> {
        QdrantStore::new(
            &self.store.qdrant_url,
            &self.store.collection_name,
            self.dimension,
        )
    }
}

#[async_trait]
impl StoreFactory for ConfiguredStore {
    async fn open(&self) -> Result<Box<dyn VectorStore>> {
        match self.store.backend {
            StoreBackendKind::Sqlite => Ok(Box::new(
                SqliteStore::open(&self.store_dir, self.dimension).await?,
            )),
            StoreBackendKind::Qdrant => {
                let store = self.qdrant()?;
                store.ensure_collection().await?;
                Ok(Box::new(store))
            }
        }
    }

    async fn reset(&self) -> Result<()> {
        let removed = match self.store.backend {
            StoreBackendKind::Sqlite => SqliteStore::destroy(&self.store_dir)?,
            StoreBackendKind::Qdrant => self.qdrant()?.delete_collection().await?,
        };

        if !removed {
            info!("No existing store to clear");
        }
        Ok(())
    }
}
