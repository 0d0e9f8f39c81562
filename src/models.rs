//! Core data types for the in-memory index.

/// One document's slice of the in-memory index: the content hash it was
/// built from plus the index-aligned vectors and locators of its chunks.
///
/// `vectors` and `locators` always have the same length; position `i` of
/// both refers to the same chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEntry {
    /// Hex SHA-256 of the source file's full content.
    pub file_hash: String,
    /// One embedding vector per chunk.
    pub vectors: Vec<Vec<f32>>,
    /// One locator per chunk (e.g. `"line 42"`, `"page 3"`).
    pub locators: Vec<String>,
}

/// Counters from one build pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Files that passed the filename filter and extension gate.
    pub visited: usize,
    /// Files adopted from the on-disk cache without re-embedding.
    pub from_cache: usize,
    /// Files chunked, embedded, and written to the cache this pass.
    pub embedded: usize,
    /// Files left unindexed this run (cache-only mode, unreadable files).
    pub skipped: usize,
}
