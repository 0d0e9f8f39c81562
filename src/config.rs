use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub index: IndexConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Root directory of the documents to index.
    pub data_root: PathBuf,
    /// Directory holding the content-addressed vector cache.
    pub cache_root: PathBuf,
    /// Maximum chunk length in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Case-insensitive substring applied to file names (not full paths).
    /// Empty matches everything.
    #[serde(default)]
    pub name_filter: String,
    /// Number of chunk texts accumulated per embedding call.
    #[serde(default = "default_max_chunks_process")]
    pub max_chunks_process: usize,
}

fn default_chunk_size() -> usize {
    512
}
fn default_max_chunks_process() -> usize {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    /// Maximum number of chunks returned per query.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Maximum Euclidean distance for a candidate to count as a match.
    #[serde(default = "default_distance_threshold")]
    pub distance_threshold: f32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            distance_threshold: default_distance_threshold(),
        }
    }
}

fn default_top_n() -> usize {
    10
}
fn default_distance_threshold() -> f32 {
    0.9
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.index.chunk_size == 0 {
        anyhow::bail!("index.chunk_size must be > 0");
    }
    if config.index.max_chunks_process == 0 {
        anyhow::bail!("index.max_chunks_process must be > 0");
    }

    if config.query.top_n < 1 {
        anyhow::bail!("query.top_n must be >= 1");
    }
    if config.query.distance_threshold <= 0.0 {
        anyhow::bail!("query.distance_threshold must be > 0");
    }

    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let file = write_config(
            r#"[index]
data_root = "./data"
cache_root = "./cache"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.index.chunk_size, 512);
        assert_eq!(config.index.max_chunks_process, 20);
        assert_eq!(config.query.top_n, 10);
        assert!((config.query.distance_threshold - 0.9).abs() < 1e-6);
        assert!(!config.embedding.is_enabled());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let file = write_config(
            r#"[index]
data_root = "./data"
cache_root = "./cache"
chunk_size = 0
"#,
        );
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_enabled_provider_requires_model_and_dims() {
        let file = write_config(
            r#"[index]
data_root = "./data"
cache_root = "./cache"

[embedding]
provider = "openai"
"#,
        );
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let file = write_config(
            r#"[index]
data_root = "./data"
cache_root = "./cache"

[embedding]
provider = "carrier-pigeon"
model = "v1"
dims = 8
"#,
        );
        assert!(load_config(file.path()).is_err());
    }
}
