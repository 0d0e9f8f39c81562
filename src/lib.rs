//! # Corpus Index
//!
//! A content-addressed embedding index for local document retrieval.
//!
//! Corpus Index walks a directory of text, Markdown, XML, and PDF files,
//! splits each into bounded chunks, embeds the chunks through an external
//! embedding model, and answers nearest-neighbor queries by exact
//! brute-force scan. Per-file vectors are cached on disk under the file's
//! content hash, so an unchanged file is never re-embedded.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Directory │──▶│   Chunker +  │──▶│ Content-     │
//! │   walk    │   │   Embedder   │   │ addressed    │
//! └───────────┘   └──────────────┘   │ cache        │
//!                                    └──────┬───────┘
//!                                           │
//!                                    ┌──────▼───────┐
//!                                    │  In-memory   │──▶ query
//!                                    │  index       │
//!                                    └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cdx build                          # hash, chunk, embed, cache
//! cdx query "how does RSA work?"     # ranked chunk retrieval
//! cdx status                         # what the cache covers
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`report`] | Explicit verbosity-carrying reporter |
//! | [`chunk`] | File-type handlers and chunk production |
//! | [`extract`] | PDF page text extraction |
//! | [`cache`] | Content-addressed vector cache |
//! | [`embedding`] | Embedding providers and the case-normalizing gateway |
//! | [`index`] | Directory walk and incremental build |
//! | [`query`] | Exact nearest-neighbor retrieval |
//! | [`models`] | Core data types |

pub mod cache;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod index;
pub mod models;
pub mod query;
pub mod report;
