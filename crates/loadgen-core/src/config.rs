use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Event-ingestion endpoint the batches are POSTed to
    pub url: String,
    /// Optional API key sent as the `x-api-key` header
    #[serde(default)]
    pub api_key: Option<String>,
    /// Events per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Target requests per second, per worker
    #[serde(default = "default_rps")]
    pub rps: f64,
    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Results file, one JSON line per dispatch
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    /// Optional per-request timeout in milliseconds; absent means
    /// unbounded, so a hung connection stalls its worker indefinitely.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_batch_size() -> usize {
    20
}

fn default_rps() -> f64 {
    1.0
}

fn default_workers() -> usize {
    5
}

fn default_log_file() -> PathBuf {
    PathBuf::from("log_api_load_test_results.jsonl")
}

impl RunConfig {
    /// A config with defaults for everything but the endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            batch_size: default_batch_size(),
            rps: default_rps(),
            workers: default_workers(),
            log_file: default_log_file(),
            timeout_ms: None,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: RunConfig = toml::from_str(&contents)?;
        Ok(config)
    }
}
