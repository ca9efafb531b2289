use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use krishi_rag::config::Settings;
use krishi_rag::indexer::Ingestor;
use krishi_rag::rag::embeddings::{Embedder, FastEmbedder};
use krishi_rag::rag::vector_store;

#[derive(Parser, Debug)]
#[command(name = "rag-ingest")]
#[command(about = "Embed the PDFs of a folder into the knowledge-base vector store")]
struct Args {
    /// Folder whose PDF files are ingested (defaults to `ingest.data_dir`)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Maximum chunk size in characters
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Overlap between chunks in characters
    #[arg(long)]
    chunk_overlap: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("krishi_rag=info")),
        )
        .init();

    let args = Args::parse();
    let mut settings = Settings::load()?;
    if let Some(size) = args.chunk_size {
        settings.ingest.chunk_size = size;
    }
    if let Some(overlap) = args.chunk_overlap {
        settings.ingest.chunk_overlap = overlap;
    }
    let dir = args.dir.unwrap_or_else(|| settings.ingest.data_dir.clone());

    if !dir.is_dir() {
        anyhow::bail!("Directory does not exist: {}", dir.display());
    }

    println!("Initializing embedding model...");
    let embedder: Arc<dyn Embedder> =
        Arc::new(FastEmbedder::new(&settings.embedding).context("loading embedding model")?);

    println!("Connecting to {:?} vector store...", settings.store.backend);
    let store = vector_store::connect(&settings.store, embedder.dimension())
        .await
        .context("connecting to vector store")?;

    let ingestor = Ingestor::new(embedder, store, &settings.ingest);

    let documents = ingestor.load_documents(&dir)?;
    println!("Loaded {} documents from {}", documents.len(), dir.display());
    if documents.is_empty() {
        println!("No PDF files found. Exiting.");
        return Ok(());
    }

    let chunks = ingestor.split(&documents);
    println!("Split into {} chunks", chunks.len());

    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let stored = ingestor
        .store_chunks(&chunks, |done| pb.set_position(done as u64))
        .await
        .context("ingestion aborted")?;

    pb.finish_with_message("done");

    println!("\nEmbedding and storage process complete!");
    println!("  Documents:  {}", documents.len());
    println!("  Chunks:     {}", stored);
    println!("  Table:      {}", settings.store.table);

    Ok(())
}
