use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use soto::indexer::extractor::extract_documents;
use soto::indexer::walker::walk_directory;
use soto::rag::index_builder::{file_id, CHUNK_OVERLAP, CHUNK_SIZE};
use soto::rag::RagEngine;

#[derive(Parser, Debug)]
#[command(name = "soto-indexer")]
#[command(about = "Index the artist's documents into the vector store")]
struct Args {
    /// Directory to recursively index
    #[arg(short, long, env = "SOTO_DATA_DIR", default_value = "./data")]
    dir: PathBuf,

    /// Qdrant server URL
    #[arg(long, env = "QDRANT_URL", default_value = "http://localhost:6334")]
    qdrant_url: String,

    /// Qdrant collection name
    #[arg(long, env = "SOTO_COLLECTION", default_value = "soto_obra")]
    collection: String,

    /// Drop the existing collection before indexing
    #[arg(long)]
    rebuild: bool,

    /// Maximum chunk size in characters
    #[arg(long, default_value_t = CHUNK_SIZE)]
    chunk_size: usize,

    /// Overlap between chunks in characters
    #[arg(long, default_value_t = CHUNK_OVERLAP)]
    chunk_overlap: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    if !args.dir.exists() {
        anyhow::bail!("Directory does not exist: {}", args.dir.display());
    }

    println!("Connecting to Qdrant at {}...", args.qdrant_url);
    let engine = RagEngine::new(&args.qdrant_url, &args.collection).await?;

    if args.rebuild {
        println!("Dropping collection '{}'...", args.collection);
        engine.vector_store().reset().await?;
    }

    println!("Scanning directory: {}", args.dir.display());
    let files = walk_directory(&args.dir);
    println!("Found {} supported files", files.len());

    if files.is_empty() {
        println!("No supported files found. Exiting.");
        return Ok(());
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut success_count = 0usize;
    let mut total_docs = 0usize;
    let mut total_chunks = 0usize;
    let mut failed_files: Vec<(PathBuf, String)> = Vec::new();

    for (path, format) in &files {
        pb.set_message(
            path.file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
        );

        match extract_documents(path, *format) {
            Ok(docs) => {
                let mut failed = false;
                for doc in &docs {
                    match engine
                        .index_document(doc, args.chunk_size, args.chunk_overlap)
                        .await
                    {
                        Ok(n) => total_chunks += n,
                        Err(e) => {
                            tracing::warn!(
                                "Failed to index {} ({}): {}",
                                path.display(),
                                file_id(path),
                                e
                            );
                            failed_files.push((path.clone(), format!("{}", e)));
                            failed = true;
                            break;
                        }
                    }
                }
                if !failed {
                    success_count += 1;
                    total_docs += docs.len();
                }
            }
            Err(e) => {
                tracing::warn!("Failed to process {}: {}", path.display(), e);
                failed_files.push((path.clone(), format!("{}", e)));
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("done");

    println!("\nIndexing complete!");
    println!("  Files processed: {}/{}", success_count, files.len());
    println!("  Documents:       {}", total_docs);
    println!("  Total chunks:    {}", total_chunks);
    println!("  Collection:      {}", args.collection);
    println!("  Qdrant URL:      {}", args.qdrant_url);

    if !failed_files.is_empty() {
        println!("\nFailed files:");
        for (path, err) in &failed_files {
            println!("  {}: {}", path.display(), err);
        }
    }

    Ok(())
}
