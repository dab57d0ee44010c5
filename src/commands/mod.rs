//! CLI commands implementation

pub mod ingest;

pub use ingest::*;
