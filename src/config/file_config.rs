use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,

    pub query: Option<QueryConfig>,
}

/// `[query]` table: pagination and statistics tunables.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct QueryConfig {
    pub default_page_size: Option<u64>,
    pub max_pages: Option<u64>,
    pub monthly_stats_buckets: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
