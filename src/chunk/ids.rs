//! Deterministic chunk identifiers

use crate::error::{Error, Result};
use crate::models::{Chunk, DocumentMetadata};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Composite chunk key `source:page:index`.
///
/// Used as the store's primary key and as the deduplication signal, so the
/// same input must always produce the same ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChunkId(String);

impl ChunkId {
    pub fn new(metadata: &DocumentMetadata, index: usize) -> Self {
        Self(format!("{}:{}", metadata.page_id(), index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split back into `(source, page, index)`.
    ///
    /// Parsed from the right, so a source containing `:` (e.g. a Windows
    /// drive letter) survives.
    pub fn parts(&self) -> (&str, u32, usize) {
        // Validated on construction
        let mut it = self.0.rsplitn(3, ':');
        let index = it.next().and_then(|s| s.parse().ok()).unwrap_or_default();
        let page = it.next().and_then(|s| s.parse().ok()).unwrap_or_default();
        let source = it.next().unwrap_or_default();
        (source, page, index)
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ChunkId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut it = s.rsplitn(3, ':');
        let index = it.next().map(str::parse::<usize>);
        let page = it.next().map(str::parse::<u32>);
        let source = it.next();

        match (source, page, index) {
            (Some(_), Some(Ok(_)), Some(Ok(_))) => Ok(Self(s.to_string())),
            _ => Err(Error::InvalidChunkId(s.to_string())),
        }
    }
}

impl TryFrom<String> for ChunkId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ChunkId> for String {
    fn from(id: ChunkId) -> Self {
        id.0
    }
}

/// Running state for ID assignment: the last `source:page` seen and the
/// index within it.
///
/// Chunks must arrive grouped by `(source, page)`, i.e. in page order and
/// then split order, which is what the splitter produces. Input that
/// revisits a page after leaving it restarts that page at index 0 and so
/// produces colliding IDs. This is not detected.
#[derive(Debug, Default)]
pub struct ChunkIdAssigner {
    last_page_id: Option<String>,
    index: usize,
}

impl ChunkIdAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// ID for the next chunk in traversal order
    pub fn next_id(&mut self, metadata: &DocumentMetadata) -> ChunkId {
        let page_id = metadata.page_id();

        if self.last_page_id.as_deref() == Some(page_id.as_str()) {
            self.index += 1;
        } else {
            self.index = 0;
        }

        let id = ChunkId(format!("{}:{}", page_id, self.index));
        self.last_page_id = Some(page_id);
        id
    }

    pub fn assign(&mut self, chunk: &mut Chunk) {
        chunk.id = Some(self.next_id(&chunk.metadata));
    }
}

/// Give every chunk its ID, in input order
pub fn calculate_chunk_ids(chunks: Vec<Chunk>) -> Vec<Chunk> {
    let mut assigner = ChunkIdAssigner::new();
    chunks
        .into_iter()
        .map(|mut chunk| {
            assigner.assign(&mut chunk);
            chunk
        })
        .collect()
}
