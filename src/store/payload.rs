//! Records written to the vector store and their Qdrant payload form

use crate::chunk::ChunkId;
use crate::error::{Error, Result};
use crate::models::Chunk;
use chrono::Utc;
use qdrant_client::qdrant::{value::Kind, PointStruct, Value as QdrantValue};
use std::collections::HashMap;
use uuid::Uuid;

/// A chunk ready to be written, with its embedding
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    pub id: ChunkId,
    pub source: String,
    pub page: u32,
    pub text: String,

    /// Blake3 hash of the chunk text
    pub content_hash: String,

    /// When this chunk was first written (RFC 3339)
    pub ingested_at: String,

    pub embedding: Vec<f32>,
}

impl ChunkRecord {
    /// Build a record from a chunk whose ID has already been assigned
    pub fn from_chunk(chunk: Chunk, embedding: Vec<f32>) -> Result<Self> {
        let id = chunk.id.ok_or_else(|| {
            Error::Store(format!(
                "chunk from {} has no ID assigned",
                chunk.metadata.page_id()
            ))
        })?;

        Ok(Self {
            content_hash: compute_content_hash(&chunk.text),
            id,
            source: chunk.metadata.source,
            page: chunk.metadata.page,
            text: chunk.text,
            ingested_at: Utc::now().to_rfc3339(),
            embedding,
        })
    }

    /// Convert to qdrant-client PointStruct
    pub fn to_point_struct(self) -> PointStruct {
        let point_id = point_uuid(&self.id).to_string();
        let payload = self.to_qdrant_payload();
        PointStruct::new(point_id, self.embedding, payload)
    }

    /// Convert to Qdrant payload format
    pub fn to_qdrant_payload(&self) -> HashMap<String, QdrantValue> {
        let mut map = HashMap::new();

        map.insert(CHUNK_ID_FIELD.to_string(), string_to_qdrant(self.id.as_str()));
        map.insert("source".to_string(), string_to_qdrant(&self.source));
        map.insert("page".to_string(), int_to_qdrant(self.page as i64));
        map.insert("text".to_string(), string_to_qdrant(&self.text));
        map.insert("content_hash".to_string(), string_to_qdrant(&self.content_hash));
        map.insert("ingested_at".to_string(), string_to_qdrant(&self.ingested_at));

        map
    }
}

/// Payload field holding the chunk ID on Qdrant points
pub const CHUNK_ID_FIELD: &str = "chunk_id";

/// Qdrant point IDs must be UUIDs or integers, so chunk IDs are mapped
/// through a name-based UUID. The original ID is kept in the payload.
pub fn point_uuid(id: &ChunkId) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_str().as_bytes())
}

/// Blake3 hex digest of chunk text
pub fn compute_content_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// Read a string field from a Qdrant payload
pub fn payload_string(payload: &HashMap<String, QdrantValue>, key: &str) -> Option<String> {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    }
}

fn string_to_qdrant(s: &str) -> QdrantValue {
    QdrantValue {
        kind: Some(Kind::StringValue(s.to_string())),
    }
}

fn int_to_qdrant(i: i64) -> QdrantValue {
    QdrantValue {
        kind: Some(Kind::IntegerValue(i)),
    }
}
