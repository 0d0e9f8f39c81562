//! Content-addressed cache for per-file embedding vectors.
//!
//! One JSON file per content hash under the cache root. An entry is written
//! once, after the whole source file has been chunked and embedded, and is
//! never mutated in place: a changed file gets a new hash and a new entry,
//! and the superseded entry is simply left behind.
//!
//! The schema carries an explicit `version` tag; decoding dispatches on it,
//! and anything that fails the schema check is reported as [`CacheError::Corrupt`]
//! so callers can fall back to recomputing instead of aborting.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Cache schema version. Entries tagged with anything else are corrupt.
pub const CACHE_VERSION: u32 = 1;

/// Read-block size for streaming file hashing.
const HASH_BLOCK_BYTES: usize = 4 * 1024 * 1024;

/// Persisted per-file entry: the file's content hash plus the vectors and
/// locators computed for its chunks, index-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub version: u32,
    /// Hex SHA-256 of the full file content; also names the entry on disk.
    pub file_hash: String,
    /// Document key: path relative to the indexed root.
    pub path: String,
    /// One embedding vector per chunk.
    pub vectors: Vec<Vec<f32>>,
    /// One locator per chunk, same order as `vectors`.
    pub locators: Vec<String>,
}

/// Why a cache load produced no entry.
#[derive(Debug)]
pub enum CacheError {
    /// No entry exists for the digest.
    NotFound,
    /// An entry exists but does not decode to the expected schema.
    Corrupt(String),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::NotFound => write!(f, "cache entry not found"),
            CacheError::Corrupt(e) => write!(f, "corrupt cache entry: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// The on-disk cache directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Open a cache directory, creating it if needed.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create cache directory {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn entry_path(&self, digest: &str) -> PathBuf {
        self.dir.join(format!("{}.json", digest))
    }

    /// Load the entry for a digest, distinguishing absent from corrupt.
    pub fn load(&self, digest: &str) -> Result<CacheEntry, CacheError> {
        let path = self.entry_path(digest);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::NotFound)
            }
            Err(e) => return Err(CacheError::Corrupt(e.to_string())),
        };

        let entry: CacheEntry =
            serde_json::from_slice(&bytes).map_err(|e| CacheError::Corrupt(e.to_string()))?;

        if entry.version != CACHE_VERSION {
            return Err(CacheError::Corrupt(format!(
                "unsupported cache version {}",
                entry.version
            )));
        }
        if entry.vectors.len() != entry.locators.len() {
            return Err(CacheError::Corrupt(format!(
                "{} vectors but {} locators",
                entry.vectors.len(),
                entry.locators.len()
            )));
        }
        if entry.file_hash != digest {
            return Err(CacheError::Corrupt(
                "entry hash does not match its digest".to_string(),
            ));
        }

        Ok(entry)
    }

    /// Persist an entry under its content hash, overwriting any existing
    /// file of that name. Same hash implies same content, so the overwrite
    /// is idempotent.
    pub fn store(&self, entry: &CacheEntry) -> Result<()> {
        let path = self.entry_path(&entry.file_hash);
        let json = serde_json::to_vec(entry).context("failed to serialize cache entry")?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write cache entry {}", path.display()))?;
        Ok(())
    }
}

/// Streaming SHA-256 over a file's full content, rendered as lowercase hex.
///
/// The digest is independent of how the file is chunked for reading.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut block = vec![0u8; HASH_BLOCK_BYTES];
    loop {
        let n = file
            .read(&mut block)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&block[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
