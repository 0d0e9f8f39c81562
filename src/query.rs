//! Exact nearest-neighbor query over the in-memory index.
//!
//! Every stored vector is scanned. Corpora are local and small, and the
//! exact brute-force pass keeps ranking fully deterministic. Winning chunks'
//! text is re-derived from the source files at query time rather than kept
//! in memory or persisted next to the vectors.

use std::collections::HashMap;

use anyhow::Result;

use crate::chunk::chunk_file;
use crate::embedding::{euclidean_distance, Embedder};
use crate::index::KnowledgeIndex;

/// One ranked query hit.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    /// Document key the chunk came from.
    pub document: String,
    /// Stored locator for the chunk (e.g. `"line 42"`, `"page 3"`).
    pub locator: String,
    /// Euclidean distance between the chunk's vector and the query vector.
    pub distance: f32,
    /// Chunk text, re-extracted from the source document.
    pub text: String,
}

/// Rank every stored vector against `text` and return the winning chunks.
///
/// Only comparisons with distance strictly below `threshold` are kept, at
/// most `top_n` are returned, and the order is ascending by distance with
/// ties broken by document key and then intra-document chunk index — so
/// repeated queries over the same index return the same sequence. A winning
/// document whose backing file has disappeared degrades to fewer results
/// with a warning, never an error.
pub fn query_index(
    index: &KnowledgeIndex,
    embedder: &Embedder,
    text: &str,
    top_n: usize,
    threshold: f32,
) -> Result<Vec<RetrievedChunk>> {
    if index.is_empty() {
        return Ok(Vec::new());
    }

    let query_vec = embedder.embed_query(text)?;

    struct Hit<'a> {
        key: &'a str,
        chunk_index: usize,
        locator: &'a str,
        distance: f32,
    }

    let mut hits: Vec<Hit> = Vec::new();
    for (key, entry) in index.entries() {
        for (chunk_index, vector) in entry.vectors.iter().enumerate() {
            let distance = euclidean_distance(&query_vec, vector);
            if distance < threshold {
                hits.push(Hit {
                    key,
                    chunk_index,
                    locator: &entry.locators[chunk_index],
                    distance,
                });
            }
        }
    }

    hits.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.key.cmp(b.key))
            .then_with(|| a.chunk_index.cmp(&b.chunk_index))
    });
    hits.truncate(top_n);

    // Re-chunk each winning document once.
    let mut wanted: HashMap<&str, Vec<usize>> = HashMap::new();
    for hit in &hits {
        wanted.entry(hit.key).or_default().push(hit.chunk_index);
    }

    let reporter = index.reporter();
    let mut extracted: HashMap<(&str, usize), String> = HashMap::new();
    for (key, chunk_indexes) in wanted {
        let path = index.data_root().join(key);
        if !path.exists() {
            reporter.warn(&format!(
                "source file {} no longer exists; dropping its matches",
                path.display()
            ));
            continue;
        }
        let chunks = match chunk_file(&path, index.chunk_size(), reporter) {
            Ok(c) => c,
            Err(e) => {
                reporter.warn(&format!("cannot re-extract {}: {:#}", path.display(), e));
                continue;
            }
        };
        for chunk_index in chunk_indexes {
            match chunks.get(chunk_index) {
                Some((_, chunk_text)) => {
                    extracted.insert((key, chunk_index), chunk_text.clone());
                }
                None => reporter.warn(&format!(
                    "chunk {} of {} no longer present after re-chunking",
                    chunk_index, key
                )),
            }
        }
    }

    // Assemble in rank order, dropping hits whose text could not be
    // recovered.
    let results = hits
        .iter()
        .filter_map(|hit| {
            extracted
                .get(&(hit.key, hit.chunk_index))
                .map(|text| RetrievedChunk {
                    document: hit.key.to_string(),
                    locator: hit.locator.to_string(),
                    distance: hit.distance,
                    text: text.clone(),
                })
        })
        .collect();

    Ok(results)
}
