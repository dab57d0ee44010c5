//! End-to-end ingestion against the SQLite store

use async_trait::async_trait;
use pdfingest::chunk::ChunkId;
use pdfingest::commands::{cmd_ingest, IngestOptions, IngestOutcome};
use pdfingest::config::Config;
use pdfingest::embed::Embedder;
use pdfingest::models::{DocumentMetadata, PageDocument};
use pdfingest::parse::PageLoader;
use pdfingest::store::{ConfiguredStore, SqliteStore, VectorStore};
use pdfingest::Result;
use std::path::Path;
use tempfile::TempDir;

struct TextFileLoader;

/// Treats each `.pdf` fixture as UTF-8 text with pages separated by `---`
#[async_trait]
impl PageLoader for TextFileLoader {
    async fn load(&self, path: &Path) -> Result<Vec<PageDocument>> {
        let content = std::fs::read_to_string(path)?;
        let source = path.display().to_string();
        Ok(content
            .split("---")
            .enumerate()
            .map(|(i, page)| PageDocument::new(page.trim(), DocumentMetadata::new(&source, i as u32)))
            .collect())
    }
}

struct ConstantEmbedder;

#[async_trait]
impl Embedder for ConstantEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.1; 4]).collect())
    }

    fn dimension(&self) -> usize {
        4
    }

    fn model_name(&self) -> &str {
        "constant"
    }
}

fn write_config(base: &Path) {
    std::fs::write(
        base.join("pdfingest.toml"),
        "[chunk]\nchunk_size = 40\nchunk_overlap = 10\n\n[embedding]\ndimension = 4\n",
    )
    .unwrap();
}

fn long_page(word: &str) -> String {
    vec![word; 30].join(" ")
}

async fn ingest(config: &Config, reset: bool) -> pdfingest::commands::IngestReport {
    let stores = ConfiguredStore::new(config);
    cmd_ingest(
        config,
        &TextFileLoader,
        &ConstantEmbedder,
        &stores,
        IngestOptions {
            dir: "manuals".to_string(),
            reset,
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_ingest_is_idempotent_and_grows_with_new_pages() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path());
    let config = Config::load_from(tmp.path().to_path_buf()).unwrap();

    let docs = config.data_dir().join("manuals");
    std::fs::create_dir_all(&docs).unwrap();
    let manual = docs.join("manual.pdf");
    std::fs::write(&manual, long_page("alpha")).unwrap();

    let first = ingest(&config, false).await;
    assert_eq!(first.outcome, IngestOutcome::Completed);
    let added = first.files[0].chunks_added;
    assert!(added > 1);
    assert_eq!(added, first.files[0].chunks_total);

    let second = ingest(&config, false).await;
    assert_eq!(second.chunks_added(), 0);

    std::fs::write(
        &manual,
        format!("{}\n---\n{}", long_page("alpha"), long_page("beta")),
    )
    .unwrap();
    let third = ingest(&config, false).await;
    assert_eq!(third.files[0].chunks_total, third.chunks_added() + added);

    let store = SqliteStore::open(&config.store_dir(), 4).await.unwrap();
    assert_eq!(store.count().await.unwrap(), third.files[0].chunks_total);

    let source = manual.display().to_string();
    let first_id = ChunkId::new(&DocumentMetadata::new(&source, 1), 0);
    let record = store.get(&first_id).await.unwrap().unwrap();
    assert_eq!(record.page, 1);
    assert!(record.text.starts_with("beta"));
    assert_eq!(record.embedding.len(), 4);
}

#[tokio::test]
async fn test_reset_rebuilds_store() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path());
    let config = Config::load_from(tmp.path().to_path_buf()).unwrap();

    let docs = config.data_dir().join("manuals");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::write(docs.join("a.pdf"), "short page").unwrap();

    ingest(&config, false).await;
    let report = ingest(&config, true).await;
    assert_eq!(report.chunks_added(), 1);

    let store = SqliteStore::open(&config.store_dir(), 4).await.unwrap();
    assert_eq!(store.all_ids().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_directory_leaves_store_untouched() {
    let tmp = TempDir::new().unwrap();
    let config = Config::load_from(tmp.path().to_path_buf()).unwrap();

    let report = ingest(&config, false).await;

    assert!(matches!(report.outcome, IngestOutcome::DirectoryNotFound(_)));
    assert!(!config.store_dir().exists());
}

#[tokio::test]
async fn test_dimension_change_is_rejected() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path());
    let mut config = Config::load_from(tmp.path().to_path_buf()).unwrap();

    let docs = config.data_dir().join("manuals");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::write(docs.join("a.pdf"), "first page").unwrap();
    ingest(&config, false).await;

    std::fs::write(docs.join("b.pdf"), "second file").unwrap();
    config.embedding.dimension = 8;
    let result = cmd_ingest(
        &config,
        &TextFileLoader,
        &ConstantEmbedder,
        &ConfiguredStore::new(&config),
        IngestOptions {
            dir: "manuals".to_string(),
            reset: false,
        },
    )
    .await;

    assert!(matches!(result, Err(pdfingest::Error::Store(_))));
    let store = SqliteStore::open(&config.store_dir(), 4).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
}
