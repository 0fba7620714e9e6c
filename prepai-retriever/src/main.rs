use clap::{Parser, Subcommand};
use prepai_embed::{EmbedConfig, FastEmbedProvider};
use prepai_retriever::storage::SnapshotStore;
use prepai_retriever::{RetrievalEngine, RetrieverConfig};
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// A CLI tool to manage and query the prepai retrieval store.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults are used if not provided.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the snapshot storage directory.
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chunk, embed, and store a document
    Add {
        /// Path to the input text file. If not provided, reads from stdin.
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Chunk size in characters (defaults to the configured size)
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// Retrieve the stored chunks most similar to a query
    Search {
        /// The query text
        query: String,
        /// Number of results to return (defaults to the configured count)
        #[arg(short, long)]
        k: Option<usize>,
        /// Emit results as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Reset the store to empty
    Clear,
    /// Show snapshot statistics without loading the embedding model
    Status,
}

#[derive(Serialize)]
struct SearchOutput {
    query: String,
    results: Vec<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RetrieverConfig::from_toml_file(path)?,
        None => RetrieverConfig::default(),
    };
    if let Some(dir) = args.storage_dir {
        config.storage_dir = dir;
    }

    match args.command {
        Commands::Add { input, chunk_size } => {
            let text = read_input(input)?;
            let chunk_size = chunk_size.unwrap_or(config.chunk_size);

            let engine = open_engine(config).await?;
            let stored = engine
                .add_document_with_chunk_size(&text, chunk_size)
                .await?;
            println!(
                "Stored {stored} chunks ({} total in store)",
                engine.count().await
            );
            Ok(())
        }
        Commands::Search { query, k, json } => {
            let k = k.unwrap_or(config.default_results);

            let engine = open_engine(config).await?;
            let results = engine.search(&query, k).await;

            if json {
                let output = SearchOutput { query, results };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else if results.is_empty() {
                println!("No matching chunks found");
            } else {
                println!("Found {} matching chunks:", results.len());
                for (rank, text) in results.iter().enumerate() {
                    println!("--- #{} ---", rank + 1);
                    println!("{text}");
                }
            }
            Ok(())
        }
        Commands::Clear => {
            let engine = open_engine(config).await?;
            engine.clear().await?;
            println!("Retrieval store cleared");
            Ok(())
        }
        Commands::Status => {
            // Inspect the snapshot directly; no need to load the model.
            let snapshot_store = SnapshotStore::new(&config.storage_dir);
            match snapshot_store.load(config.dimension).await? {
                Some((index, documents)) => {
                    println!("Snapshot: {}", config.storage_dir.display());
                    println!("  Chunks: {}", documents.count());
                    println!("  Dimension: {}", index.dimension());
                }
                None => {
                    println!(
                        "No snapshot at {} (empty store)",
                        config.storage_dir.display()
                    );
                }
            }
            Ok(())
        }
    }
}

fn read_input(input: Option<PathBuf>) -> anyhow::Result<String> {
    match input {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

async fn open_engine(config: RetrieverConfig) -> anyhow::Result<RetrievalEngine> {
    let provider = Arc::new(FastEmbedProvider::create(EmbedConfig::minilm_l6()).await?);
    Ok(RetrievalEngine::new(config, provider).await?)
}
