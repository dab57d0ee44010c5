//! Text chunking
//!
//! This module turns page documents into overlapping chunks and gives each
//! chunk its deterministic ID:
//! - Recursive splitting on paragraph, line, word, then character boundaries
//! - Window merging bounded by `chunk_size` with `chunk_overlap` carry-over
//! - `source:page:index` IDs that are stable across reruns

mod boundaries;
mod ids;

pub use boundaries::*;
pub use ids::*;

use crate::config::ChunkConfig;
use crate::models::{Chunk, PageDocument};

/// Recursive character splitter
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    pub fn new(config: &ChunkConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Split every page in order, copying each page's metadata onto its chunks
    pub fn split_documents(&self, pages: &[PageDocument]) -> Vec<Chunk> {
        pages
            .iter()
            .flat_map(|page| {
                self.split_text(&page.text)
                    .into_iter()
                    .map(move |text| Chunk::new(text, page.metadata.clone()))
            })
            .collect()
    }

    /// Split a single text into chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        self.split_recursive(text, &separators)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // First separator present in the text wins; finer ones are kept for
        // pieces that are still too long.
        let mut separator = separators.last().copied().unwrap_or("");
        let mut finer: &[&str] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = sep;
                break;
            }
            if text.contains(sep) {
                separator = sep;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(merge_splits(&fitting, self.chunk_size, self.chunk_overlap));
                fitting.clear();
            }

            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(merge_splits(&fitting, self.chunk_size, self.chunk_overlap));
        }

        chunks
    }
}
