use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Repository layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Paging configuration
    #[serde(default)]
    pub paging: PagingConfig,

    /// Caching configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Reindex orchestration configuration
    #[serde(default)]
    pub reindex: ReindexConfig,
}

impl RepositoryConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("SEARCHSTORE_CONFIG").unwrap_or_else(|_| "config/searchstore.toml".to_string());

        config::Config::builder()
            // Override defaults with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: SEARCHSTORE_)
            .add_source(
                config::Environment::with_prefix("SEARCHSTORE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            paging: PagingConfig::default(),
            cache: CacheConfig::default(),
            reindex: ReindexConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Page size applied when a query sets a page number without a limit
    #[serde(default = "default_page_limit")]
    pub default_limit: usize,

    /// Hard cap on page size
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// Server-side lifetime of a snapshot (scroll) context, in seconds
    #[serde(default = "default_snapshot_lifetime")]
    pub snapshot_lifetime_secs: u64,
}

impl PagingConfig {
    pub fn snapshot_lifetime(&self) -> Duration {
        Duration::from_secs(self.snapshot_lifetime_secs)
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_limit(),
            snapshot_lifetime_secs: default_snapshot_lifetime(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether query/document caching is enabled at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Default expiry for cached query results, in seconds
    #[serde(default = "default_cache_ttl")]
    pub default_ttl_secs: u64,

    /// Max entries held by the in-process cache implementation
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl_secs: default_cache_ttl(),
            max_capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReindexConfig {
    /// Throttle window for the global enqueue lock, in seconds. A fleet of
    /// concurrently-starting processes collapses into one enqueue per window.
    #[serde(default = "default_throttle_window")]
    pub throttle_window_secs: u64,

    /// Max enqueue attempts allowed inside one throttle window
    #[serde(default = "default_throttle_hits")]
    pub throttle_max_hits: u32,

    /// Delete the old physical index once the alias has been repointed
    #[serde(default = "default_true")]
    pub delete_old_index: bool,
}

impl ReindexConfig {
    pub fn throttle_window(&self) -> Duration {
        Duration::from_secs(self.throttle_window_secs)
    }
}

impl Default for ReindexConfig {
    fn default() -> Self {
        Self {
            throttle_window_secs: default_throttle_window(),
            throttle_max_hits: default_throttle_hits(),
            delete_old_index: true,
        }
    }
}

fn default_page_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    1000
}

fn default_snapshot_lifetime() -> u64 {
    120
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_throttle_window() -> u64 {
    60
}

fn default_throttle_hits() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RepositoryConfig::default();
        assert_eq!(config.paging.default_limit, 10);
        assert_eq!(config.paging.max_limit, 1000);
        assert!(config.cache.enabled);
        assert_eq!(config.reindex.throttle_window_secs, 60);
        assert_eq!(config.reindex.throttle_max_hits, 1);
    }

    #[test]
    fn test_durations() {
        let config = RepositoryConfig::default();
        assert_eq!(config.paging.snapshot_lifetime(), Duration::from_secs(120));
        assert_eq!(config.cache.default_ttl(), Duration::from_secs(300));
        assert_eq!(config.reindex.throttle_window(), Duration::from_secs(60));
    }
}
