//! Run configuration
//!
//! The configuration is loaded once (TOML file plus CLI overrides) and then
//! treated as an immutable value for the lifetime of the run.

use crate::error::{IndexerError, IndexerResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete configuration for one indexing run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexerConfig {
    #[serde(default)]
    pub elastic: ElasticConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
}

/// Connection settings for the search backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticConfig {
    pub scheme: String,
    pub address: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            address: "127.0.0.1".to_string(),
            port: 9200,
            username: None,
            password: None,
        }
    }
}

impl ElasticConfig {
    /// Base URL of the backend, e.g. `http://127.0.0.1:9200`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.address, self.port)
    }
}

/// Extraction and upload settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Index the documents are scrolled from.
    pub source_index: String,
    /// Prefix of the per-language target indices.
    pub target_prefix: String,
    /// Sort key for the scroll query.
    pub sort_key: String,
    /// Half-width of the context window around a numeric anchor.
    pub ambit: usize,
    /// Hits per scroll page.
    pub page_size: usize,
    /// Total buffered record count that triggers a flush.
    pub chunk_threshold: usize,
    /// Scroll cursor keep-alive, in minutes.
    pub keep_alive_minutes: u64,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            source_index: String::new(),
            target_prefix: String::new(),
            sort_key: "common.publication_date".to_string(),
            ambit: 15,
            page_size: 1000,
            chunk_threshold: 1_000_000,
            keep_alive_minutes: 5,
        }
    }
}

impl IndexingConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_minutes * 60)
    }
}

impl IndexerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> IndexerResult<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            IndexerError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: IndexerConfig = toml::from_str(&content)
            .map_err(|e| IndexerError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Validate the configuration before the run starts.
    pub fn validate(&self) -> IndexerResult<()> {
        if self.indexing.source_index.is_empty() {
            return Err(IndexerError::Config(
                "indexing.source_index must be set".to_string(),
            ));
        }

        if self.indexing.page_size == 0 {
            return Err(IndexerError::Config(
                "indexing.page_size must be greater than 0".to_string(),
            ));
        }

        if self.indexing.chunk_threshold == 0 {
            return Err(IndexerError::Config(
                "indexing.chunk_threshold must be greater than 0".to_string(),
            ));
        }

        if self.indexing.keep_alive_minutes == 0 {
            return Err(IndexerError::Config(
                "indexing.keep_alive_minutes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = IndexerConfig::default();
        assert_eq!(config.elastic.base_url(), "http://127.0.0.1:9200");
        assert_eq!(config.indexing.ambit, 15);
        assert_eq!(config.indexing.page_size, 1000);
        assert_eq!(config.indexing.chunk_threshold, 1_000_000);
        assert_eq!(config.indexing.keep_alive(), Duration::from_secs(300));
    }

    #[test]
    fn test_validate_rejects_missing_source_index() {
        let config = IndexerConfig::default();
        assert!(config.validate().is_err());

        let mut config = IndexerConfig::default();
        config.indexing.source_index = "patents".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[elastic]
scheme = "https"
address = "search.internal"
port = 9243

[indexing]
source_index = "patents"
target_prefix = "nums_"
ambit = 10
"#
        )
        .unwrap();

        let config = IndexerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.elastic.base_url(), "https://search.internal:9243");
        assert_eq!(config.indexing.source_index, "patents");
        assert_eq!(config.indexing.ambit, 10);
        // unspecified fields fall back to defaults
        assert_eq!(config.indexing.page_size, 1000);
    }
}
