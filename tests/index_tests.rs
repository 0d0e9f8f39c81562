//! End-to-end build/query tests over temporary directories.
//!
//! The embedding model is an external collaborator, so these tests plug a
//! deterministic letter-frequency provider into the gateway: identical text
//! embeds to an identical vector, and unrelated text lands far away. That is
//! enough to exercise caching, invalidation, ranking, and re-extraction
//! without a network.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use corpus_index::cache::hash_file;
use corpus_index::config::IndexConfig;
use corpus_index::embedding::{Embedder, EmbeddingProvider};
use corpus_index::index::{BuildMode, KnowledgeIndex};
use corpus_index::query::query_index;
use corpus_index::report::{Reporter, Verbosity};

/// 26-dimensional normalized letter-frequency embedding.
///
/// Only ASCII lowercase letters contribute, so it also catches any path
/// where the gateway fails to lower-case its input.
struct LetterFrequencyProvider;

impl EmbeddingProvider for LetterFrequencyProvider {
    fn model_name(&self) -> &str {
        "letter-frequency"
    }
    fn dims(&self) -> usize {
        26
    }
    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0f32; 26];
                for c in text.chars() {
                    if c.is_ascii_lowercase() {
                        v[(c as u8 - b'a') as usize] += 1.0;
                    }
                }
                let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm > 0.0 {
                    for x in &mut v {
                        *x /= norm;
                    }
                }
                v
            })
            .collect())
    }
}

fn embedder() -> Embedder {
    Embedder::new(Box::new(LetterFrequencyProvider))
}

fn reporter() -> Reporter {
    Reporter::new(Verbosity::Quiet)
}

fn setup(files: &[(&str, &str)]) -> (TempDir, IndexConfig) {
    let tmp = TempDir::new().unwrap();
    let data_root = tmp.path().join("data");
    let cache_root = tmp.path().join("cache");
    fs::create_dir_all(&data_root).unwrap();
    for (name, body) in files {
        let path = data_root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, body).unwrap();
    }
    let config = IndexConfig {
        data_root,
        cache_root,
        chunk_size: 512,
        name_filter: String::new(),
        max_chunks_process: 20,
    };
    (tmp, config)
}

fn cache_files(config: &IndexConfig) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(&config.cache_root)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    files.sort();
    files
}

#[test]
fn test_build_twice_touches_no_new_cache_entries() {
    let (_tmp, config) = setup(&[
        ("a.txt", "The quick brown fox"),
        ("b.txt", "Exact duplicate irrelevant text"),
    ]);
    let emb = embedder();

    let mut index = KnowledgeIndex::open(&config, reporter()).unwrap();
    let first = index.build(&emb, BuildMode::Full).unwrap();
    assert_eq!(first.visited, 2);
    assert_eq!(first.embedded, 2);
    let after_first = cache_files(&config);
    assert_eq!(after_first.len(), 2);

    // Same index instance: everything short-circuits in memory.
    let second = index.build(&emb, BuildMode::Full).unwrap();
    assert_eq!(second.embedded, 0);
    assert_eq!(second.from_cache, 0);
    assert_eq!(cache_files(&config), after_first);

    // A fresh process run adopts everything from the cache.
    let mut fresh = KnowledgeIndex::open(&config, reporter()).unwrap();
    let stats = fresh.build(&emb, BuildMode::Full).unwrap();
    assert_eq!(stats.from_cache, 2);
    assert_eq!(stats.embedded, 0);
    assert_eq!(cache_files(&config), after_first);
}

#[test]
fn test_mutation_writes_new_entry_and_orphans_old() {
    let (_tmp, config) = setup(&[
        ("a.txt", "The quick brown fox"),
        ("b.txt", "Exact duplicate irrelevant text"),
    ]);
    let emb = embedder();

    let mut index = KnowledgeIndex::open(&config, reporter()).unwrap();
    index.build(&emb, BuildMode::Full).unwrap();
    let before = cache_files(&config);

    fs::write(config.data_root.join("a.txt"), "The quick brown fox!").unwrap();

    let mut fresh = KnowledgeIndex::open(&config, reporter()).unwrap();
    let stats = fresh.build(&emb, BuildMode::Full).unwrap();
    assert_eq!(stats.embedded, 1);
    assert_eq!(stats.from_cache, 1);

    // New entry under the new hash; the superseded entry is left untouched.
    let after = cache_files(&config);
    assert_eq!(after.len(), 3);
    for old in &before {
        assert!(after.contains(old), "orphaned entry was removed: {:?}", old);
    }
}

#[test]
fn test_empty_directory_builds_empty_index() {
    let (_tmp, config) = setup(&[]);
    let emb = embedder();

    let mut index = KnowledgeIndex::open(&config, reporter()).unwrap();
    let stats = index.build(&emb, BuildMode::Full).unwrap();
    assert_eq!(stats.visited, 0);
    assert!(index.is_empty());

    let results = query_index(&index, &emb, "anything at all", 10, 0.9).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_ineligible_files_are_silently_excluded() {
    let (_tmp, config) = setup(&[("notes.bin", "binary-ish"), ("prog.rs", "fn main() {}")]);
    let emb = embedder();

    let mut index = KnowledgeIndex::open(&config, reporter()).unwrap();
    let stats = index.build(&emb, BuildMode::Full).unwrap();
    assert_eq!(stats.visited, 0);
    assert!(index.is_empty());
}

#[test]
fn test_threshold_and_top_n_bounds() {
    let (_tmp, config) = setup(&[
        ("a.txt", "the quick brown fox"),
        ("b.txt", "a lazy dog sleeps"),
        ("c.txt", "quick foxes and lazy dogs"),
        ("d.txt", "zzz zzz zzz"),
    ]);
    let emb = embedder();

    let mut index = KnowledgeIndex::open(&config, reporter()).unwrap();
    index.build(&emb, BuildMode::Full).unwrap();

    let capped = query_index(&index, &emb, "quick brown foxes", 2, 1.5).unwrap();
    assert!(capped.len() <= 2);
    for hit in &capped {
        assert!(hit.distance < 1.5);
    }

    let strict = query_index(&index, &emb, "quick brown foxes", 10, 1e-6).unwrap();
    for hit in &strict {
        assert!(hit.distance < 1e-6);
    }
}

#[test]
fn test_case_never_affects_matching() {
    let (_tmp, config) = setup(&[
        ("crypto.txt", "rsa is a public key cryptosystem"),
        ("dns.txt", "domain name resolution walkthrough"),
    ]);
    let emb = embedder();

    let mut index = KnowledgeIndex::open(&config, reporter()).unwrap();
    index.build(&emb, BuildMode::Full).unwrap();

    let upper = query_index(&index, &emb, "RSA", 5, 1.5).unwrap();
    let lower = query_index(&index, &emb, "rsa", 5, 1.5).unwrap();
    assert_eq!(upper, lower);
    assert!(!upper.is_empty());
}

#[test]
fn test_repeated_queries_are_deterministic() {
    let (_tmp, config) = setup(&[
        ("a.txt", "alpha beta gamma"),
        ("b.txt", "beta gamma delta"),
        ("c.txt", "gamma delta epsilon"),
    ]);
    let emb = embedder();

    let mut index = KnowledgeIndex::open(&config, reporter()).unwrap();
    index.build(&emb, BuildMode::Full).unwrap();

    let first = query_index(&index, &emb, "beta gamma", 10, 1.5).unwrap();
    for _ in 0..3 {
        let again = query_index(&index, &emb, "beta gamma", 10, 1.5).unwrap();
        assert_eq!(again, first);
    }
}

#[test]
fn test_self_query_scenario_returns_exactly_own_chunk() {
    let (_tmp, config) = setup(&[
        ("a.txt", "The quick brown fox"),
        ("b.txt", "Exact duplicate irrelevant text"),
    ]);
    let emb = embedder();

    let mut index = KnowledgeIndex::open(&config, reporter()).unwrap();
    index.build(&emb, BuildMode::Full).unwrap();

    // chunk_size 512 leaves each file as a single chunk.
    for (_, entry) in index.entries() {
        assert_eq!(entry.vectors.len(), 1);
        assert_eq!(entry.locators.len(), 1);
    }

    let results = query_index(&index, &emb, "The quick brown fox", 10, 0.01).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document, "a.txt");
    assert_eq!(results[0].text, "The quick brown fox");
    assert!(results[0].distance < 0.01);
}

#[test]
fn test_cache_only_mode_never_embeds() {
    let (_tmp, config) = setup(&[("a.txt", "seen before")]);
    let emb = embedder();

    let mut index = KnowledgeIndex::open(&config, reporter()).unwrap();
    index.build(&emb, BuildMode::Full).unwrap();

    fs::write(config.data_root.join("b.txt"), "never embedded").unwrap();

    let mut fresh = KnowledgeIndex::open(&config, reporter()).unwrap();
    let stats = fresh.build(&emb, BuildMode::CacheOnly).unwrap();
    assert_eq!(stats.from_cache, 1);
    assert_eq!(stats.embedded, 0);
    assert_eq!(stats.skipped, 1);
    assert_eq!(fresh.len(), 1);
    assert_eq!(cache_files(&config).len(), 1);
}

#[test]
fn test_corrupt_cache_entry_triggers_recompute() {
    let (_tmp, config) = setup(&[
        ("a.txt", "the quick brown fox"),
        ("b.txt", "a lazy dog sleeps"),
    ]);
    let emb = embedder();

    let mut index = KnowledgeIndex::open(&config, reporter()).unwrap();
    index.build(&emb, BuildMode::Full).unwrap();

    // Clobber a.txt's entry with garbage.
    let digest = hash_file(&config.data_root.join("a.txt")).unwrap();
    let entry_path = config.cache_root.join(format!("{}.json", digest));
    assert!(entry_path.exists());
    fs::write(&entry_path, b"not json at all").unwrap();

    let mut fresh = KnowledgeIndex::open(&config, reporter()).unwrap();
    let stats = fresh.build(&emb, BuildMode::Full).unwrap();
    assert_eq!(stats.embedded, 1);
    assert_eq!(stats.from_cache, 1);

    // The recompute rewrote the entry in place.
    let rewritten = fs::read(&entry_path).unwrap();
    assert!(serde_json::from_slice::<serde_json::Value>(&rewritten).is_ok());
}

#[test]
fn test_missing_source_file_degrades_query() {
    let (_tmp, config) = setup(&[
        ("a.txt", "the quick brown fox"),
        ("b.txt", "a lazy dog sleeps"),
    ]);
    let emb = embedder();

    let mut index = KnowledgeIndex::open(&config, reporter()).unwrap();
    index.build(&emb, BuildMode::Full).unwrap();

    fs::remove_file(config.data_root.join("a.txt")).unwrap();

    let results = query_index(&index, &emb, "the quick brown fox", 10, 1.5).unwrap();
    assert!(results.iter().all(|hit| hit.document != "a.txt"));
}

#[test]
fn test_name_filter_is_case_insensitive_substring() {
    let (_tmp, config) = setup(&[
        ("CRYPTO_notes.txt", "rsa and elliptic curves"),
        ("recipes.txt", "how to bake bread"),
        ("sub/more-Crypto.md", "diffie hellman key exchange"),
    ]);
    let config = IndexConfig {
        name_filter: "crypto".to_string(),
        ..config
    };
    let emb = embedder();

    let mut index = KnowledgeIndex::open(&config, reporter()).unwrap();
    let stats = index.build(&emb, BuildMode::Full).unwrap();
    assert_eq!(stats.visited, 2);

    let keys: Vec<&str> = index.entries().map(|(k, _)| k).collect();
    assert!(keys.contains(&"CRYPTO_notes.txt"));
    assert!(keys.iter().any(|k| k.ends_with("more-Crypto.md")));
    assert!(!keys.contains(&"recipes.txt"));
}

#[test]
fn test_subdirectory_keys_are_relative_paths() {
    let (_tmp, config) = setup(&[("sub/dir/notes.txt", "nested document body")]);
    let emb = embedder();

    let mut index = KnowledgeIndex::open(&config, reporter()).unwrap();
    index.build(&emb, BuildMode::Full).unwrap();

    let results = query_index(&index, &emb, "nested document body", 1, 0.5).unwrap();
    assert_eq!(results.len(), 1);
    let expected: PathBuf = ["sub", "dir", "notes.txt"].iter().collect();
    assert_eq!(results[0].document, expected.to_string_lossy());
    assert_eq!(results[0].text, "nested document body");
}

#[test]
fn test_multi_chunk_document_keeps_alignment() {
    // Small chunk size and batch size force several embedding batches plus a
    // final partial flush.
    let body = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
    let (_tmp, config) = setup(&[("long.txt", body)]);
    let config = IndexConfig {
        chunk_size: 12,
        max_chunks_process: 4,
        ..config
    };
    let emb = embedder();

    let mut index = KnowledgeIndex::open(&config, reporter()).unwrap();
    index.build(&emb, BuildMode::Full).unwrap();

    let (_, entry) = index.entries().next().unwrap();
    assert!(entry.vectors.len() > 4, "want a full batch plus a partial one");
    assert_eq!(entry.vectors.len(), entry.locators.len());
    let chunk_count = entry.vectors.len();

    // Every stored chunk can be recovered by index at query time.
    let results = query_index(&index, &emb, body, chunk_count, 2.0).unwrap();
    assert_eq!(results.len(), chunk_count);
    let total_words: usize = results
        .iter()
        .map(|hit| hit.text.split_whitespace().count())
        .sum();
    assert_eq!(total_words, body.split_whitespace().count());
}
