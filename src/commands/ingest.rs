//! Ingest command implementation

use crate::chunk::{calculate_chunk_ids, ChunkId, TextSplitter};
use crate::config::Config;
use crate::embed::{embed_in_batches, Embedder};
use crate::error::{Error, Result};
use crate::models::Chunk;
use crate::parse::PageLoader;
use crate::progress::embedding_progress;
use crate::store::{ChunkRecord, StoreFactory};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Ingest options
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Subdirectory of the data root holding the PDFs
    pub dir: String,
    /// Destroy the store before ingesting
    pub reset: bool,
}

/// How an ingestion run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "path", rename_all = "snake_case")]
pub enum IngestOutcome {
    DirectoryNotFound(PathBuf),
    NoPdfFiles(PathBuf),
    Completed,
}

/// Per-file counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub name: String,
    pub chunks_total: usize,
    pub chunks_added: usize,
}

/// Result of an ingestion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub outcome: IngestOutcome,
    pub files: Vec<FileReport>,
}

impl IngestReport {
    fn stopped(outcome: IngestOutcome) -> Self {
        Self {
            outcome,
            files: Vec::new(),
        }
    }

    /// Chunks inserted across all files
    pub fn chunks_added(&self) -> usize {
        self.files.iter().map(|f| f.chunks_added).sum()
    }
}

/// Ingest every PDF in `data_dir/<dir>` into the vector store
pub async fn cmd_ingest(
    config: &Config,
    loader: &dyn PageLoader,
    embedder: &dyn Embedder,
    stores: &dyn StoreFactory,
    options: IngestOptions,
) -> Result<IngestReport> {
    if options.reset {
        info!("Clearing vector store");
        stores.reset().await?;
    }

    let dir = config.data_dir().join(&options.dir);
    if !dir.is_dir() {
        debug!("Directory not found: {}", dir.display());
        return Ok(IngestReport::stopped(IngestOutcome::DirectoryNotFound(dir)));
    }

    let pdfs = list_pdf_files(&dir)?;
    if pdfs.is_empty() {
        debug!("No PDF files found in {}", dir.display());
        return Ok(IngestReport::stopped(IngestOutcome::NoPdfFiles(dir)));
    }

    info!("Found {} PDF(s) in {}", pdfs.len(), dir.display());
    for pdf in &pdfs {
        info!("  - {}", file_name(pdf));
    }

    let splitter = TextSplitter::new(&config.chunk);
    let mut files = Vec::with_capacity(pdfs.len());

    for pdf in &pdfs {
        let report = ingest_file(config, loader, embedder, stores, &splitter, pdf).await?;
        files.push(report);
    }

    Ok(IngestReport {
        outcome: IngestOutcome::Completed,
        files,
    })
}

async fn ingest_file(
    config: &Config,
    loader: &dyn PageLoader,
    embedder: &dyn Embedder,
    stores: &dyn StoreFactory,
    splitter: &TextSplitter,
    path: &Path,
) -> Result<FileReport> {
    let name = file_name(path);
    info!("Processing {}", name);

    let pages = loader.load(path).await?;
    let chunks = calculate_chunk_ids(splitter.split_documents(&pages));
    let chunks_total = chunks.len();
    debug!("{}: {} pages, {} chunks", name, pages.len(), chunks_total);

    let store = stores.open().await?;
    let candidates = chunk_ids(&chunks)?;
    let existing = store.existing_ids(&candidates).await?;
    debug!("{} of {} chunks already stored", existing.len(), chunks_total);

    let new_chunks = filter_new_chunks(chunks, &existing);
    if new_chunks.is_empty() {
        info!("All documents already in DB");
        return Ok(FileReport {
            name,
            chunks_total,
            chunks_added: 0,
        });
    }

    info!("Adding {} new chunks", new_chunks.len());

    let texts: Vec<String> = new_chunks.iter().map(|c| c.text.clone()).collect();
    let pb = embedding_progress(texts.len() as u64, &name);
    let embeddings = embed_in_batches(embedder, texts, config.embedding.batch_size, Some(&pb)).await;
    pb.finish_and_clear();
    let embeddings = embeddings?;

    let records = new_chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| ChunkRecord::from_chunk(chunk, embedding))
        .collect::<Result<Vec<_>>>()?;
    let chunks_added = records.len();

    store.add_chunks(records).await?;
    store.persist().await?;

    Ok(FileReport {
        name,
        chunks_total,
        chunks_added,
    })
}

/// `*.pdf` files directly inside `dir`, sorted by file name.
/// Symlinks count when they resolve to a regular file.
pub fn list_pdf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path.extension().and_then(|e| e.to_str()) == Some("pdf");
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }

    pdfs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(pdfs)
}

fn chunk_ids(chunks: &[Chunk]) -> Result<Vec<ChunkId>> {
    chunks
        .iter()
        .map(|c| {
            c.id.clone().ok_or_else(|| {
                Error::Store(format!("chunk from {} has no ID", c.metadata.page_id()))
            })
        })
        .collect()
}

/// Keep chunks whose ID is not in `existing`, preserving order
fn filter_new_chunks(chunks: Vec<Chunk>, existing: &HashSet<ChunkId>) -> Vec<Chunk> {
    chunks
        .into_iter()
        .filter(|c| c.id.as_ref().is_some_and(|id| !existing.contains(id)))
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Print an ingestion report to console
pub fn print_ingest_report(report: &IngestReport) {
    match &report.outcome {
        IngestOutcome::DirectoryNotFound(path) => {
            println!("Directory not found: {}", path.display());
        }
        IngestOutcome::NoPdfFiles(path) => {
            println!("No PDF files found in {}", path.display());
        }
        IngestOutcome::Completed => {
            println!("\n📄 Ingested {} PDF(s)\n", report.files.len());
            for file in &report.files {
                if file.chunks_added == 0 {
                    println!("• {} ({} chunks, none new)", file.name, file.chunks_total);
                } else {
                    println!(
                        "• {} ({} chunks, {} added)",
                        file.name, file.chunks_total, file.chunks_added
                    );
                }
            }
            println!("\nTotal chunks added: {}", report.chunks_added());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::LazyEmbedder;
    use crate::models::{DocumentMetadata, PageDocument};
    use crate::store::VectorStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Loader that returns fixed pages keyed by file name
    #[derive(Default)]
    struct FakeLoader {
        pages: HashMap<String, Vec<String>>,
    }

    impl FakeLoader {
        fn with(mut self, name: &str, pages: &[&str]) -> Self {
            self.pages
                .insert(name.to_string(), pages.iter().map(|p| p.to_string()).collect());
            self
        }
    }

    #[async_trait]
    impl PageLoader for FakeLoader {
        async fn load(&self, path: &Path) -> Result<Vec<PageDocument>> {
            let texts = self.pages.get(&file_name(path)).cloned().unwrap_or_default();
            let source = path.display().to_string();
            Ok(texts
                .into_iter()
                .enumerate()
                .map(|(i, t)| PageDocument::new(t, DocumentMetadata::new(&source, i as u32)))
                .collect())
        }
    }

    struct FakeEmbedder;

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "fake"
        }
    }

    #[derive(Default)]
    struct Shared {
        records: Mutex<Vec<ChunkRecord>>,
        opens: Mutex<usize>,
        resets: Mutex<usize>,
    }

    struct MemoryStore(Arc<Shared>);

    #[async_trait]
    impl VectorStore for MemoryStore {
        async fn all_ids(&self) -> Result<HashSet<ChunkId>> {
            Ok(self.0.records.lock().unwrap().iter().map(|r| r.id.clone()).collect())
        }

        async fn add_chunks(&self, records: Vec<ChunkRecord>) -> Result<()> {
            self.0.records.lock().unwrap().extend(records);
            Ok(())
        }

        async fn persist(&self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    struct MemoryStores(Arc<Shared>);

    impl MemoryStores {
        fn opens(&self) -> usize {
            *self.0.opens.lock().unwrap()
        }

        fn records(&self) -> Vec<ChunkRecord> {
            self.0.records.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StoreFactory for MemoryStores {
        async fn open(&self) -> Result<Box<dyn VectorStore>> {
            *self.0.opens.lock().unwrap() += 1;
            Ok(Box::new(MemoryStore(self.0.clone())))
        }

        async fn reset(&self) -> Result<()> {
            *self.0.resets.lock().unwrap() += 1;
            self.0.records.lock().unwrap().clear();
            Ok(())
        }
    }

    fn setup(files: &[&str]) -> (Config, TempDir) {
        let tmp = TempDir::new().unwrap();
        let config = Config::load_from(tmp.path().to_path_buf()).unwrap();
        let dir = config.data_dir().join("docs");
        std::fs::create_dir_all(&dir).unwrap();
        for f in files {
            std::fs::write(dir.join(f), b"%PDF-1.4").unwrap();
        }
        (config, tmp)
    }

    fn options(reset: bool) -> IngestOptions {
        IngestOptions {
            dir: "docs".to_string(),
            reset,
        }
    }

    #[tokio::test]
    async fn test_missing_directory_opens_no_store() {
        let (config, _tmp) = setup(&[]);
        let stores = MemoryStores::default();
        let opts = IngestOptions {
            dir: "nope".to_string(),
            reset: false,
        };

        let report = cmd_ingest(&config, &FakeLoader::default(), &FakeEmbedder, &stores, opts)
            .await
            .unwrap();

        assert!(matches!(report.outcome, IngestOutcome::DirectoryNotFound(_)));
        assert_eq!(stores.opens(), 0);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stop_outcomes_are_not_logged_at_info() {
        let (config, _tmp) = setup(&["notes.txt"]);
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        for dir in ["nope", "docs"] {
            let opts = IngestOptions {
                dir: dir.to_string(),
                reset: false,
            };
            cmd_ingest(&config, &FakeLoader::default(), &FakeEmbedder, &MemoryStores::default(), opts)
                .await
                .unwrap();
        }

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(!output.contains("Directory not found"));
        assert!(!output.contains("No PDF files found"));
    }

    #[tokio::test]
    async fn test_no_pdfs_opens_no_store() {
        let (config, _tmp) = setup(&["notes.txt", "scan.PDF"]);
        let stores = MemoryStores::default();

        let report = cmd_ingest(
            &config,
            &FakeLoader::default(),
            &FakeEmbedder,
            &stores,
            options(false),
        )
        .await
        .unwrap();

        assert!(matches!(report.outcome, IngestOutcome::NoPdfFiles(_)));
        assert!(report.files.is_empty());
        assert_eq!(stores.opens(), 0);
    }

    #[tokio::test]
    async fn test_files_processed_in_name_order() {
        let (config, _tmp) = setup(&["b.pdf", "a.pdf"]);
        let loader = FakeLoader::default()
            .with("a.pdf", &["alpha first", "alpha second"])
            .with("b.pdf", &["beta only"]);
        let stores = MemoryStores::default();

        let report = cmd_ingest(&config, &loader, &FakeEmbedder, &stores, options(false))
            .await
            .unwrap();

        assert_eq!(report.outcome, IngestOutcome::Completed);
        let names: Vec<&str> = report.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
        assert_eq!(report.files[0].chunks_added, 2);
        assert_eq!(report.files[1].chunks_added, 1);
        assert_eq!(stores.opens(), 2);

        let records = stores.records();
        let ids: Vec<(String, u32, usize)> = records
            .iter()
            .map(|r| {
                let (source, page, index) = r.id.parts();
                assert_eq!(source, r.source);
                assert_eq!(page, r.page);
                (file_name(Path::new(source)), page, index)
            })
            .collect();
        assert_eq!(
            ids,
            vec![
                ("a.pdf".to_string(), 0, 0),
                ("a.pdf".to_string(), 1, 0),
                ("b.pdf".to_string(), 0, 0),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_run_never_builds_embedder() {
        let (config, _tmp) = setup(&[]);
        let stores = MemoryStores::default();
        let mut embedding = config.embedding.clone();
        embedding.backend = crate::config::EmbeddingBackendKind::Fastembed;
        embedding.model = "no-such-model".to_string();
        let embedder = LazyEmbedder::new(&embedding);

        let report = cmd_ingest(&config, &FakeLoader::default(), &embedder, &stores, options(false))
            .await
            .unwrap();

        assert!(matches!(report.outcome, IngestOutcome::NoPdfFiles(_)));
        assert!(!embedder.is_initialized());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_pdfs_are_listed() {
        let tmp = TempDir::new().unwrap();
        let real = tmp.path().join("real");
        let docs = tmp.path().join("docs");
        std::fs::create_dir_all(&real).unwrap();
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(real.join("a.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(docs.join("b.pdf"), b"%PDF-1.4").unwrap();
        std::os::unix::fs::symlink(real.join("a.pdf"), docs.join("a.pdf")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("missing.pdf"), docs.join("c.pdf")).unwrap();
        std::fs::create_dir_all(docs.join("folder.pdf")).unwrap();

        let names: Vec<String> = list_pdf_files(&docs)
            .unwrap()
            .iter()
            .map(|p| file_name(p))
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn test_rerun_adds_nothing() {
        let (config, _tmp) = setup(&["a.pdf"]);
        let loader = FakeLoader::default().with("a.pdf", &["one", "two"]);
        let stores = MemoryStores::default();

        cmd_ingest(&config, &loader, &FakeEmbedder, &stores, options(false))
            .await
            .unwrap();
        let second = cmd_ingest(&config, &loader, &FakeEmbedder, &stores, options(false))
            .await
            .unwrap();

        assert_eq!(second.files[0].chunks_total, 2);
        assert_eq!(second.files[0].chunks_added, 0);
        assert_eq!(stores.records().len(), 2);
    }

    #[tokio::test]
    async fn test_new_page_only_adds_its_chunks() {
        let (config, _tmp) = setup(&["a.pdf"]);
        let stores = MemoryStores::default();

        let v1 = FakeLoader::default().with("a.pdf", &["one"]);
        cmd_ingest(&config, &v1, &FakeEmbedder, &stores, options(false))
            .await
            .unwrap();

        let v2 = FakeLoader::default().with("a.pdf", &["one", "two"]);
        let report = cmd_ingest(&config, &v2, &FakeEmbedder, &stores, options(false))
            .await
            .unwrap();

        assert_eq!(report.files[0].chunks_added, 1);
        let ids: Vec<String> = stores
            .records()
            .iter()
            .map(|r| r.id.parts())
            .map(|(_, page, index)| format!("{}:{}", page, index))
            .collect();
        assert_eq!(ids, vec!["0:0", "1:0"]);
    }

    #[tokio::test]
    async fn test_reset_clears_before_ingest() {
        let (config, _tmp) = setup(&["a.pdf"]);
        let loader = FakeLoader::default().with("a.pdf", &["one"]);
        let stores = MemoryStores::default();

        cmd_ingest(&config, &loader, &FakeEmbedder, &stores, options(false))
            .await
            .unwrap();
        let report = cmd_ingest(&config, &loader, &FakeEmbedder, &stores, options(true))
            .await
            .unwrap();

        assert_eq!(report.files[0].chunks_added, 1);
        assert_eq!(*stores.0.resets.lock().unwrap(), 1);
        assert_eq!(stores.records().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_runs_even_when_directory_missing() {
        let (config, _tmp) = setup(&[]);
        let stores = MemoryStores::default();
        let opts = IngestOptions {
            dir: "nope".to_string(),
            reset: true,
        };

        cmd_ingest(&config, &FakeLoader::default(), &FakeEmbedder, &stores, opts)
            .await
            .unwrap();

        assert_eq!(*stores.0.resets.lock().unwrap(), 1);
    }

    #[test]
    fn test_filter_new_chunks_keeps_order() {
        let meta = DocumentMetadata::new("a.pdf", 0);
        let chunks = calculate_chunk_ids(vec![
            Chunk::new("x", meta.clone()),
            Chunk::new("y", meta.clone()),
            Chunk::new("z", meta.clone()),
        ]);
        let existing = HashSet::from([ChunkId::new(&meta, 1)]);

        let kept: Vec<String> = filter_new_chunks(chunks, &existing)
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(kept, vec!["x", "z"]);
    }

    #[test]
    fn test_report_serializes_outcome() {
        let report = IngestReport::stopped(IngestOutcome::NoPdfFiles(PathBuf::from("data/x")));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"]["status"], "no_pdf_files");
        assert_eq!(json["outcome"]["path"], "data/x");
    }
}
