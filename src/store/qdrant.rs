//! Qdrant vector database integration

use super::{payload_string, point_uuid, ChunkRecord, VectorStore, CHUNK_ID_FIELD};
use crate::chunk::ChunkId;
use crate::error::{Error, Result};
use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, with_payload_selector::SelectorOptions, CreateCollectionBuilder,
    Distance, GetPointsBuilder, PayloadIncludeSelector, PointId, PointStruct,
    ScrollPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder, WithPayloadSelector,
};
use qdrant_client::Qdrant;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Points fetched per existence query
const LOOKUP_BATCH: usize = 256;

/// Qdrant store handle
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl QdrantStore {
    /// Create a new store connection directly with URL and collection name
    pub fn new(url: &str, collection: &str, dimension: usize) -> Result<Self> {
        debug!("Connecting to Qdrant at {}", url);

        let client = Qdrant::from_url(url)
            .skip_compatibility_check()
            .build()
            .map_err(|e| Error::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            collection: collection.to_string(),
            dimension,
        })
    }

    /// Ensure the collection exists
    pub async fn ensure_collection(&self) -> Result<()> {
        if self.client.collection_exists(&self.collection).await? {
            debug!("Collection {} already exists", self.collection);
            return Ok(());
        }

        info!(
            "Creating collection {} with dimension {}",
            self.collection, self.dimension
        );

        let vectors_config = VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine);
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(vectors_config),
            )
            .await?;

        Ok(())
    }

    /// Delete the collection if it exists
    pub async fn delete_collection(&self) -> Result<bool> {
        if !self.client.collection_exists(&self.collection).await? {
            return Ok(false);
        }

        info!("Deleting collection {}", self.collection);
        self.client.delete_collection(&self.collection).await?;
        Ok(true)
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn all_ids(&self) -> Result<HashSet<ChunkId>> {
        let mut all_ids: HashSet<ChunkId> = HashSet::new();
        let mut offset: Option<PointId> = None;

        loop {
            let mut scroll_builder = ScrollPointsBuilder::new(&self.collection)
                .limit(1000u32)
                .with_payload(
                    chunk_id_selector()
                        .selector_options
                        .expect("chunk_id_selector always sets selector options"),
                )
                .with_vectors(false);

            if let Some(ref o) = offset {
                scroll_builder = scroll_builder.offset(o.clone());
            }

            let response = self.client.scroll(scroll_builder).await?;
            if response.result.is_empty() {
                break;
            }

            for point in &response.result {
                match payload_string(&point.payload, CHUNK_ID_FIELD) {
                    Some(raw) => {
                        all_ids.insert(raw.parse()?);
                    }
                    None => warn!("Point without {} in {}", CHUNK_ID_FIELD, self.collection),
                }
            }

            offset = response.next_page_offset;
            if offset.is_none() {
                break;
            }
        }

        Ok(all_ids)
    }

    async fn existing_ids(&self, candidates: &[ChunkId]) -> Result<HashSet<ChunkId>> {
        let mut found = HashSet::new();

        for batch in candidates.chunks(LOOKUP_BATCH) {
            let by_point: HashMap<String, &ChunkId> = batch
                .iter()
                .map(|id| (point_uuid(id).to_string(), id))
                .collect();
            let ids: Vec<PointId> = by_point.keys().map(|k| PointId::from(k.clone())).collect();

            let response = self
                .client
                .get_points(
                    GetPointsBuilder::new(&self.collection, ids)
                        .with_payload(false)
                        .with_vectors(false),
                )
                .await?;

            for point in response.result {
                if let Some(chunk_id) = point_id_to_uuid_string(point.id)
                    .and_then(|uuid| by_point.get(&uuid))
                {
                    found.insert((*chunk_id).clone());
                }
            }
        }

        Ok(found)
    }

    async fn add_chunks(&self, records: Vec<ChunkRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        if let Some(mismatch) = records.iter().find(|r| r.embedding.len() != self.dimension) {
            return Err(Error::Qdrant(format!(
                "Vector dimension mismatch for collection '{}': expected {} (got {})",
                self.collection,
                self.dimension,
                mismatch.embedding.len()
            )));
        }

        debug!(
            "Upserting {} points to collection {}",
            records.len(),
            self.collection
        );

        let points: Vec<PointStruct> = records.into_iter().map(|r| r.to_point_struct()).collect();
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await?;

        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        // Writes are acknowledged with wait=true; the server owns durability
        Ok(())
    }
}

/// Payload selector returning only the chunk ID field
fn chunk_id_selector() -> WithPayloadSelector {
    WithPayloadSelector {
        selector_options: Some(SelectorOptions::Include(PayloadIncludeSelector {
            fields: vec![CHUNK_ID_FIELD.to_string()],
        })),
    }
}

fn point_id_to_uuid_string(id: Option<PointId>) -> Option<String> {
    match id?.point_id_options? {
        PointIdOptions::Uuid(uuid) => Some(uuid),
        PointIdOptions::Num(_) => None,
    }
}
