//! PDF loading via pdf-extract

use super::{normalize_page_text, PageLoader};
use crate::error::{Error, Result};
use crate::models::{DocumentMetadata, PageDocument};
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

/// Loads PDFs one page at a time
#[derive(Debug, Default, Clone)]
pub struct PdfLoader;

impl PdfLoader {
    pub fn new() -> Self {
        Self
    }
}

/// Pair extracted page texts with `{source, page}` metadata
pub fn pages_from_texts(source: &str, texts: Vec<String>) -> Vec<PageDocument> {
    texts
        .into_iter()
        .enumerate()
        .map(|(page, text)| {
            PageDocument::new(
                normalize_page_text(&text),
                DocumentMetadata::new(source, page as u32),
            )
        })
        .collect()
}

#[async_trait]
impl PageLoader for PdfLoader {
    async fn load(&self, path: &Path) -> Result<Vec<PageDocument>> {
        let source = path.display().to_string();
        debug!("Extracting pages from {}", source);

        // pdf-extract is synchronous and CPU bound
        let path_buf = path.to_path_buf();
        let texts = tokio::task::spawn_blocking(move || pdf_extract::extract_text_by_pages(&path_buf))
            .await?
            .map_err(|e| Error::Pdf {
                path: source.clone(),
                message: e.to_string(),
            })?;

        debug!("Extracted {} pages from {}", texts.len(), source);
        Ok(pages_from_texts(&source, texts))
    }
}
