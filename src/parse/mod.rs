//! Page extraction
//!
//! This module turns a file on disk into an ordered list of page documents.
//! Text extraction itself is delegated to `pdf-extract`.

mod pdf;

pub use pdf::*;

use crate::error::Result;
use crate::models::PageDocument;
use async_trait::async_trait;
use std::path::Path;

/// Trait for page-level document loaders
#[async_trait]
pub trait PageLoader: Send + Sync {
    /// Load a file as one document per physical page, in page order
    async fn load(&self, path: &Path) -> Result<Vec<PageDocument>>;
}

/// Normalize extracted page text: unify line endings and strip
/// form feeds and NULs some PDF producers leave behind.
pub fn normalize_page_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| *c != '\u{000C}' && *c != '\0')
        .collect()
}
