//! Default values for configuration

use std::path::PathBuf;

/// Name of the config file looked up in the base directory
pub const CONFIG_FILE_NAME: &str = "pdfingest.toml";

/// Default data root, relative to the base directory
pub fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Default vector store directory, relative to the base directory
pub fn default_store_dir() -> PathBuf {
    PathBuf::from("vectorstore")
}

/// Default maximum characters per chunk
pub fn default_chunk_size() -> usize {
    800
}

/// Default overlap characters between chunks
pub fn default_chunk_overlap() -> usize {
    80
}

/// Default embedding model (served by Ollama)
pub fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

/// Default Ollama URL for local development
pub fn default_embedding_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

/// Default embedding dimension for nomic-embed-text
pub fn default_embedding_dimension() -> usize {
    768
}

/// Default batch size for embedding
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default Qdrant URL (gRPC port)
pub fn default_qdrant_url() -> String {
    "http://127.0.0.1:6334".to_string()
}

/// Default collection name
pub fn default_collection_name() -> String {
    "pdf_chunks".to_string()
}
