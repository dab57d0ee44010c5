//! Document and chunk types shared by the loader, splitter and store.

use crate::chunk::ChunkId;
use serde::{Deserialize, Serialize};

/// Provenance carried from a page down to every chunk cut from it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Path of the PDF the text came from
    pub source: String,

    /// 0-based page index within the PDF
    pub page: u32,
}

impl DocumentMetadata {
    pub fn new(source: impl Into<String>, page: u32) -> Self {
        Self {
            source: source.into(),
            page,
        }
    }

    /// `source:page`, the prefix shared by every chunk ID on this page
    pub fn page_id(&self) -> String {
        format!("{}:{}", self.source, self.page)
    }
}

/// Text of a single physical page
#[derive(Debug, Clone)]
pub struct PageDocument {
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl PageDocument {
    pub fn new(text: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// A bounded slice of a page's text
#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: String,
    pub metadata: DocumentMetadata,

    /// Set once by [`crate::chunk::ChunkIdAssigner`] before storage
    pub id: Option<ChunkId>,
}

impl Chunk {
    pub fn new(text: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
            id: None,
        }
    }
}
