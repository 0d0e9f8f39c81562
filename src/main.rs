//! # Corpus Index CLI (`cdx`)
//!
//! The `cdx` binary builds and queries a content-addressed embedding index
//! over a local directory of documents.
//!
//! ## Usage
//!
//! ```bash
//! cdx --config ./config/cdx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cdx build` | Walk the data root; hash, chunk, embed, and cache every eligible file |
//! | `cdx query "<text>"` | Build the in-memory index for this run, then retrieve the nearest chunks |
//! | `cdx status` | Show what the current tree and cache cover, without embedding anything |
//!
//! ## Examples
//!
//! ```bash
//! # Index a directory of notes and papers
//! cdx build --config ./config/cdx.toml
//!
//! # Retrieve context for a question
//! cdx query "Tell me about the RSA algorithm" --top-n 5
//!
//! # Query without recomputing anything (cache hits only)
//! cdx query "key exchange" --cached-only
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use corpus_index::config;
use corpus_index::embedding::{DisabledProvider, Embedder};
use corpus_index::index::{BuildMode, KnowledgeIndex};
use corpus_index::query::query_index;
use corpus_index::report::{Reporter, Verbosity};

/// Corpus Index — a content-addressed embedding index for local document
/// retrieval.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/cdx.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "cdx",
    about = "Corpus Index — a content-addressed embedding index for local document retrieval",
    version,
    long_about = "Corpus Index walks a directory of text, Markdown, XML, and PDF files, \
    chunks and embeds them through an external embedding model, caches the vectors per \
    content hash, and answers nearest-neighbor queries by exact brute-force search."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/cdx.toml")]
    config: PathBuf,

    /// Warnings only.
    #[arg(long, global = true)]
    quiet: bool,

    /// Per-file progress detail.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Index the data root.
    ///
    /// Hashes every eligible file, adopts cached vectors where the content
    /// hash matches, and chunks + embeds the rest. Safe to re-run: unchanged
    /// files are never re-embedded.
    Build {
        /// Adopt cached entries only; never chunk or embed.
        #[arg(long)]
        cached_only: bool,
    },

    /// Retrieve the chunks nearest to a query string.
    ///
    /// Builds the in-memory index for this run (recomputing missing cache
    /// entries unless `--cached-only`), embeds the query, and prints ranked
    /// hits with their source document and locator.
    Query {
        /// The query text.
        query: String,

        /// Maximum number of chunks to return.
        #[arg(long)]
        top_n: Option<usize>,

        /// Maximum Euclidean distance for a match.
        #[arg(long)]
        threshold: Option<f32>,

        /// Never chunk or embed documents; use cached vectors only.
        #[arg(long)]
        cached_only: bool,
    },

    /// Show per-document chunk counts and content hashes.
    ///
    /// Loads the index in cache-only mode, so no embedding provider is
    /// contacted.
    Status,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };
    let reporter = Reporter::new(verbosity);

    match cli.command {
        Commands::Build { cached_only } => {
            let embedder = Embedder::from_config(&cfg.embedding)?;
            let mut index = KnowledgeIndex::open(&cfg.index, reporter)?;
            let mode = if cached_only {
                BuildMode::CacheOnly
            } else {
                BuildMode::Full
            };
            let stats = index.build(&embedder, mode)?;

            println!("build");
            println!("  files visited: {}", stats.visited);
            println!("  loaded from cache: {}", stats.from_cache);
            println!("  embedded: {}", stats.embedded);
            println!("  skipped: {}", stats.skipped);
            println!("ok");
        }

        Commands::Query {
            query,
            top_n,
            threshold,
            cached_only,
        } => {
            let embedder = Embedder::from_config(&cfg.embedding)?;
            let mut index = KnowledgeIndex::open(&cfg.index, reporter)?;
            let mode = if cached_only {
                BuildMode::CacheOnly
            } else {
                BuildMode::Full
            };
            index.build(&embedder, mode)?;

            let top_n = top_n.unwrap_or(cfg.query.top_n);
            let threshold = threshold.unwrap_or(cfg.query.distance_threshold);
            let results = query_index(&index, &embedder, &query, top_n, threshold)?;

            if results.is_empty() {
                println!("No results.");
                return Ok(());
            }
            for (i, hit) in results.iter().enumerate() {
                println!(
                    "{}. [{:.4}] {} {}",
                    i + 1,
                    hit.distance,
                    hit.document,
                    hit.locator
                );
                println!("    {}", hit.text.replace('\n', " ").trim());
                println!();
            }
        }

        Commands::Status => {
            let embedder = Embedder::new(Box::new(DisabledProvider));
            let mut index = KnowledgeIndex::open(&cfg.index, reporter)?;
            index.build(&embedder, BuildMode::CacheOnly)?;

            println!("status");
            let mut total_chunks = 0usize;
            for (key, entry) in index.entries() {
                total_chunks += entry.vectors.len();
                println!(
                    "  {}: {} chunks ({})",
                    key,
                    entry.vectors.len(),
                    &entry.file_hash[..12]
                );
            }
            println!("  documents: {}", index.len());
            println!("  chunks: {}", total_chunks);
            println!("ok");
        }
    }

    Ok(())
}
