use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use coachrag::chain::{Document, RagChain};
use coachrag::config::Config;
use coachrag::embedder::Embedder;
use coachrag::embedder::mock::MockEmbedder;
use coachrag::generator::mock::MockGenerator;
use coachrag::retriever;
use coachrag::store::VectorStore;

#[derive(Parser)]
#[command(name = "coachrag", about = "Local study-coach RAG core", version)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, default_value = "config.json")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk, embed and store course files
    Ingest {
        /// Text files to ingest
        files: Vec<PathBuf>,
    },
    /// Search the vector store for passages near a query
    Search {
        query: String,
        /// Number of passages to return (default from config)
        #[arg(short)]
        k: Option<usize>,
    },
    /// Lexical passage retrieval over a single file, no index needed
    Retrieve {
        /// File to retrieve from
        #[arg(long)]
        file: PathBuf,
        /// Question to match passages against
        #[arg(long)]
        query: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    config.validate()?;

    match cli.command {
        Command::Ingest { files } => ingest(&config, &files),
        Command::Search { query, k } => search(&config, &query, k.unwrap_or(config.search_top_k)),
        Command::Retrieve { file, query } => retrieve(&config, &file, &query),
    }
}

/// MockEmbedder stands in until a real embedding backend is attached; its
/// word-hash vectors are stable across runs, so the store stays usable.
fn open_pipeline(config: &Config) -> Result<(Arc<VectorStore>, RagChain)> {
    let store = Arc::new(
        VectorStore::open(&config.store_dir)
            .with_context(|| format!("failed to open store at {}", config.store_dir))?,
    );
    store.load(config.model.dimensions)?;

    let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(config.model.dimensions));
    let generator = Arc::new(MockGenerator::default());
    let chain = RagChain::new(embedder, store.clone(), generator);
    Ok((store, chain))
}

fn ingest(config: &Config, files: &[PathBuf]) -> Result<()> {
    anyhow::ensure!(!files.is_empty(), "no files to ingest");
    let (_, chain) = open_pipeline(config)?;

    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        documents.push(Document {
            text,
            source: path.display().to_string(),
        });
    }

    let count = chain.ingest(&documents, config.chunk_size, config.chunk_overlap)?;
    println!("ingested {count} chunks from {} files", files.len());
    Ok(())
}

fn search(config: &Config, query: &str, k: usize) -> Result<()> {
    let (store, _) = open_pipeline(config)?;

    let embedder = MockEmbedder::new(config.model.dimensions);
    let query_vec = embedder.embed(query)?;
    let hits = store.search(&query_vec, k)?;

    if hits.is_empty() {
        println!("no results (store is empty?)");
        return Ok(());
    }
    for hit in hits {
        let meta = store.get(hit.index)?;
        let preview: String = meta.text.chars().take(120).collect();
        println!(
            "{:.4}  {}@{}  {}",
            hit.score, meta.source, meta.offset, preview
        );
    }
    Ok(())
}

fn retrieve(config: &Config, file: &PathBuf, query: &str) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let passages = retriever::retrieve_passages(
        &text,
        query,
        config.lexical.chunk_size,
        config.lexical.overlap,
        config.lexical.top_k,
    );

    if passages.is_empty() {
        println!("no passages");
        return Ok(());
    }
    for doc in passages {
        println!("[{}] {}", doc.source, doc.text);
    }
    Ok(())
}
