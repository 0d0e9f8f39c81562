//! Knowledge index build: directory walk, content hashing, and the per-file
//! cache/recompute state machine.
//!
//! The in-memory table maps document keys (paths relative to the data root)
//! to their vectors and locators. It is rebuilt each process run: files whose
//! content hash matches a persisted cache entry are adopted directly, and
//! everything else is chunked and embedded through the gateway. The table is
//! mutated only by [`KnowledgeIndex::build`]; queries treat it as read-only.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::cache::{hash_file, CacheEntry, CacheError, CacheStore, CACHE_VERSION};
use crate::chunk::{chunk_file, kind_for};
use crate::config::IndexConfig;
use crate::embedding::Embedder;
use crate::models::{BuildStats, DocumentEntry};
use crate::report::Reporter;

/// Whether a build may recompute missing entries or must rely on the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Chunk and embed anything the cache cannot supply.
    Full,
    /// Adopt cached entries only; uncached files stay unindexed this run.
    CacheOnly,
}

/// In-memory knowledge index over one data root.
pub struct KnowledgeIndex {
    data_root: PathBuf,
    chunk_size: usize,
    /// Lowercased filename filter; empty matches everything.
    name_filter: String,
    max_chunks_process: usize,
    cache: CacheStore,
    entries: BTreeMap<String, DocumentEntry>,
    reporter: Reporter,
}

impl KnowledgeIndex {
    /// Open an index over the configured roots, creating them if needed.
    pub fn open(config: &IndexConfig, reporter: Reporter) -> Result<Self> {
        std::fs::create_dir_all(&config.data_root).with_context(|| {
            format!(
                "failed to create data directory {}",
                config.data_root.display()
            )
        })?;
        let cache = CacheStore::open(&config.cache_root)?;

        Ok(Self {
            data_root: config.data_root.clone(),
            chunk_size: config.chunk_size,
            name_filter: config.name_filter.to_lowercase(),
            max_chunks_process: config.max_chunks_process,
            cache,
            entries: BTreeMap::new(),
            reporter,
        })
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Document keys and entries, in sorted key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &DocumentEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Walk the data root and bring the in-memory table up to date.
    ///
    /// Unreadable or unextractable files are skipped with a warning; an
    /// embedding failure is a hard error and aborts the build. Visiting zero
    /// eligible files is not an error, just a warning and an empty index.
    pub fn build(&mut self, embedder: &Embedder, mode: BuildMode) -> Result<BuildStats> {
        let mut stats = BuildStats::default();
        self.reporter
            .info(&format!("building index from {}", self.data_root.display()));

        let walker = WalkDir::new(&self.data_root).sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    self.reporter.warn(&format!("walk error: {}", e));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();

            // Filename filter, then extension gate.
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_lowercase(),
                None => continue,
            };
            if !name.contains(&self.name_filter) {
                continue;
            }
            if kind_for(path).is_none() {
                continue;
            }

            let key = path
                .strip_prefix(&self.data_root)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();
            stats.visited += 1;

            self.visit_file(path, &key, embedder, mode, &mut stats)?;
        }

        if stats.visited == 0 {
            self.reporter.warn(&format!(
                "no eligible files under {}",
                self.data_root.display()
            ));
        }

        Ok(stats)
    }

    /// Per-file state machine: hash, in-memory check, cache load, then
    /// (build mode permitting) chunk + embed + store + adopt.
    fn visit_file(
        &mut self,
        path: &Path,
        key: &str,
        embedder: &Embedder,
        mode: BuildMode,
        stats: &mut BuildStats,
    ) -> Result<()> {
        let digest = match hash_file(path) {
            Ok(d) => d,
            Err(e) => {
                self.reporter
                    .warn(&format!("cannot hash {}: {}", path.display(), e));
                stats.skipped += 1;
                return Ok(());
            }
        };

        // Already up to date this run.
        if self
            .entries
            .get(key)
            .map(|e| e.file_hash == digest)
            .unwrap_or(false)
        {
            return Ok(());
        }

        match self.cache.load(&digest) {
            Ok(cached) => {
                self.reporter
                    .detail(&format!(" - {} loaded from cache {}", key, &digest[..12]));
                self.entries.insert(
                    key.to_string(),
                    DocumentEntry {
                        file_hash: cached.file_hash,
                        vectors: cached.vectors,
                        locators: cached.locators,
                    },
                );
                stats.from_cache += 1;
                return Ok(());
            }
            Err(CacheError::NotFound) => {}
            Err(e @ CacheError::Corrupt(_)) => {
                self.reporter
                    .warn(&format!("{} for {}; recomputing", e, key));
            }
        }

        if mode == BuildMode::CacheOnly {
            stats.skipped += 1;
            return Ok(());
        }

        self.reporter.detail(&format!(" - processing {}", key));
        let chunks = match chunk_file(path, self.chunk_size, &self.reporter) {
            Ok(c) => c,
            Err(e) => {
                self.reporter
                    .warn(&format!("cannot extract {}: {:#}", path.display(), e));
                stats.skipped += 1;
                return Ok(());
            }
        };

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
        let mut locators: Vec<String> = Vec::with_capacity(chunks.len());
        let mut batch: Vec<String> = Vec::new();
        let mut batch_locators: Vec<String> = Vec::new();

        for (locator, text) in chunks {
            if text.is_empty() {
                continue;
            }
            batch_locators.push(locator);
            batch.push(text);
            if batch.len() >= self.max_chunks_process {
                vectors.extend(embedder.embed_batch(&batch)?);
                locators.append(&mut batch_locators);
                batch.clear();
            }
        }
        if !batch.is_empty() {
            vectors.extend(embedder.embed_batch(&batch)?);
            locators.append(&mut batch_locators);
        }

        // Stored only once the whole chunk sequence has been embedded; an
        // interrupted file leaves no entry behind.
        let entry = CacheEntry {
            version: CACHE_VERSION,
            file_hash: digest,
            path: key.to_string(),
            vectors,
            locators,
        };
        self.cache.store(&entry)?;

        let CacheEntry {
            file_hash,
            vectors,
            locators,
            ..
        } = entry;
        self.entries.insert(
            key.to_string(),
            DocumentEntry {
                file_hash,
                vectors,
                locators,
            },
        );
        stats.embedded += 1;
        Ok(())
    }
}
