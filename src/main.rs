//! pdfingest CLI entry point

use clap::Parser;
use pdfingest::{
    commands::{cmd_ingest, print_ingest_report, IngestOptions},
    config::Config,
    embed::LazyEmbedder,
    error::Result,
    parse::PdfLoader,
    progress::LogWriterFactory,
    store::ConfiguredStore,
};
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdfingest")]
#[command(version, about = "Ingest PDF files into a vector store", long_about = None)]
struct Cli {
    /// Subdirectory of the data directory containing the PDFs
    #[arg(short, long)]
    dir: String,

    /// Delete the vector store before ingesting
    #[arg(long)]
    reset: bool,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    let config = load_config(cli.config.as_deref())?;
    debug!("Data directory: {}", config.data_dir().display());

    let loader = PdfLoader::new();
    let embedder = LazyEmbedder::new(&config.embedding);
    let stores = ConfiguredStore::new(&config);

    let options = IngestOptions {
        dir: cli.dir,
        reset: cli.reset,
    };

    let report = cmd_ingest(&config, &loader, &embedder, &stores, options).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_ingest_report(&report);
    }

    Ok(())
}

/// Explicit config file, or `pdfingest.toml` in the working directory if present
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::load_from(std::env::current_dir()?),
    }
}
