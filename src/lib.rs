//! pdfingest - Idempotent PDF ingestion into a vector store
//!
//! This crate provides:
//! - Page-level PDF loading and recursive character chunking
//! - Deterministic `source:page:index` chunk IDs so reruns only add new chunks
//! - Embedding via Ollama or local FastEmbed models
//! - A local SQLite vector store, or Qdrant

pub mod chunk;
pub mod commands;
pub mod config;
pub mod embed;
pub mod error;
pub mod models;
pub mod parse;
pub mod progress;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
