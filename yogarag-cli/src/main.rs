//! YogaRAG CLI - build a corpus and query it
//!
//! # Commands
//!
//! ```bash
//! # Embed pre-chunked passages into the corpus
//! yogarag ingest passages.json
//!
//! # Show ranked passages for a question
//! yogarag search "how to relax in corpse pose"
//!
//! # Answer a question (safety screen + retrieval)
//! yogarag ask "is vajrasana good after meals?"
//!
//! # Embed text and show vector stats
//! yogarag embed "corpse pose" --query
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use yogarag_lib::{
    answer::Assistant,
    config::Settings,
    embed::{Embedder, LocalEmbedder},
    retrieve::Retriever,
    store::{JsonlStore, Passage},
};

#[derive(Parser)]
#[command(name = "yogarag")]
#[command(about = "Grounded answers to yoga questions from an embedded corpus")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./yogarag.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed a JSON array of {title, source, content} passages into the corpus
    Ingest {
        /// Passages file
        input: PathBuf,

        /// Corpus file (overrides corpus.path)
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Keep existing entries instead of rebuilding the corpus
        #[arg(long)]
        append: bool,
    },

    /// Show the passages retrieved for a query
    Search {
        /// Query text
        query: String,

        /// Number of results to return (overrides retrieval.top_k)
        #[arg(short, long)]
        k: Option<usize>,

        /// Corpus file (overrides corpus.path)
        #[arg(long)]
        corpus: Option<PathBuf>,
    },

    /// Answer a question and print the response as JSON
    Ask {
        /// Question text
        query: String,

        /// Number of passages to use (overrides retrieval.top_k)
        #[arg(short, long)]
        k: Option<usize>,

        /// Corpus file (overrides corpus.path)
        #[arg(long)]
        corpus: Option<PathBuf>,
    },

    /// Embed text and show vector info
    Embed {
        /// Text to embed
        text: String,

        /// Treat as query (uses the model's query prompt, if any)
        #[arg(short, long)]
        query: bool,
    },
}

fn build_retriever(
    settings: &Settings,
    corpus: Option<PathBuf>,
) -> Result<Retriever<LocalEmbedder, JsonlStore>> {
    let path = corpus.unwrap_or_else(|| settings.corpus.path.clone());
    let store = JsonlStore::new(path);

    println!("Loading {} model (first run downloads it)...", settings.embedding.model);
    let embedder = LocalEmbedder::new(settings.embedding.model)?;

    Ok(Retriever::new(embedder, store)
        .with_metric(settings.retrieval.metric)
        .with_threshold(settings.retrieval.threshold)
        .with_poses(settings.disambiguation.poses.clone()))
}

fn read_passages(input: &Path) -> Result<Vec<Passage>> {
    let text =
        fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", input.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Ingest {
            input,
            corpus,
            append,
        } => {
            let passages = read_passages(&input)?;
            println!("Loaded {} passages from '{}'", passages.len(), input.display());

            let mut retriever = build_retriever(&settings, corpus)?;
            let count = if append {
                retriever.index(passages)?
            } else {
                retriever.reindex(passages)?
            };
            println!(
                "Done! '{}' contains {} entries ({} new)",
                retriever.store().path().display(),
                retriever.len()?,
                count
            );
        }

        Commands::Search { query, k, corpus } => {
            let k = k.unwrap_or(settings.retrieval.top_k);
            let retriever = build_retriever(&settings, corpus)?;
            if retriever.is_empty()? {
                tracing::warn!(path = %retriever.store().path().display(), "corpus is empty");
            }

            println!("\nSearching: '{query}' (k={k})");
            let results = retriever.retrieve(&query, k)?;

            println!("\n=== Results ===\n");
            if results.is_empty() {
                println!("No passages passed the similarity threshold.");
            }
            for (i, result) in results.iter().enumerate() {
                println!("#{} (score: {:.4}) {}", i + 1, result.score, result.citation());
                println!("---");
                let preview: String = result.content.chars().take(300).collect();
                let ellipsis = if result.content.chars().count() > 300 { "..." } else { "" };
                println!("{preview}{ellipsis}\n");
            }
        }

        Commands::Ask { query, k, corpus } => {
            let k = k.unwrap_or(settings.retrieval.top_k);
            let retriever = build_retriever(&settings, corpus)?;
            let assistant = Assistant::new(retriever, settings.safety.clone(), k);

            let answer = assistant.ask(&query)?;
            println!("{}", serde_json::to_string_pretty(&answer)?);
        }

        Commands::Embed { text, query } => {
            println!("Loading {} model (first run downloads it)...", settings.embedding.model);
            let embedder = LocalEmbedder::new(settings.embedding.model)?;

            let embedding = if query {
                println!("Embedding as query: {text}");
                embedder.embed_query(&text)?
            } else {
                println!("Embedding as document: {text}");
                embedder
                    .embed_documents(&[text.as_str()])?
                    .into_iter()
                    .next()
                    .context("model returned no embeddings")?
            };

            println!("\nEmbedding stats:");
            println!("  Model: {}", embedder.model_name());
            println!("  Dimensions: {}", embedding.len());
            println!("  First 5 values: {:?}", &embedding[..embedding.len().min(5)]);
            println!("  Min: {:.4}", embedding.iter().copied().fold(f32::INFINITY, f32::min));
            println!("  Max: {:.4}", embedding.iter().copied().fold(f32::NEG_INFINITY, f32::max));
        }
    }

    Ok(())
}
