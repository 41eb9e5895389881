//! Application configuration.
//!
//! All tunable constants of the engine live here as named configuration:
//! vote weight, page size, marker and cache TTLs, and the hot-ranking
//! constants. Loaded from YAML files or environment variables.

use serde::Deserialize;

use crate::interfaces::HydrationPolicy;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "palaver.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "PALAVER_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "PALAVER";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "PALAVER_LOG";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage backend configuration.
    pub storage: StorageConfig,
    /// Ranking configuration (vote weight, hot constants).
    pub ranking: RankingConfig,
    /// Paginated read configuration.
    pub paging: PagingConfig,
    /// Vote lifecycle configuration (marker TTL, optional vote window).
    pub votes: VoteConfig,
}

/// Storage backend discriminator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    Redis,
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage type discriminator.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// Redis connection URL.
    pub url: String,
    /// Prefix for all keys.
    pub key_prefix: String,
    /// Per-request timeout against the store, in milliseconds.
    pub request_timeout_ms: u64,
    /// TTL for cached community-scoped indexes, in seconds.
    pub scoped_index_ttl_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Redis,
            url: "redis://localhost:6379".to_string(),
            key_prefix: "palaver".to_string(),
            request_timeout_ms: 1000,
            scoped_index_ttl_secs: 60,
        }
    }
}

/// Which ranking strategy `Board::rank` exposes.
///
/// The live score index is always the incremental tally; `Hot` supplements
/// it at read time rather than replacing the stored order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingStrategyKind {
    Tally,
    #[default]
    Hot,
}

/// Ranking configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Strategy exposed by `Board::rank`.
    pub strategy: RankingStrategyKind,
    /// Score delta contributed by a single vote.
    pub vote_weight: f64,
    /// Reference instant subtracted from post timestamps (unix seconds).
    /// Default: 2020-01-01T00:00:00Z.
    pub epoch_offset: i64,
    /// Seconds of age that offset one order of magnitude of net votes.
    pub decay_divisor: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            strategy: RankingStrategyKind::Hot,
            vote_weight: 432.0,
            epoch_offset: 1_577_808_000,
            decay_divisor: 43_200.0,
        }
    }
}

/// Paginated read configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Posts per page.
    pub page_size: u64,
    /// What to do when an index entry has no info record.
    pub hydration: HydrationPolicy,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            hydration: HydrationPolicy::Partial,
        }
    }
}

/// Vote lifecycle configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoteConfig {
    /// TTL of the per-(post, user) "has voted" marker, in seconds.
    pub marker_ttl_secs: u64,
    /// When set, casts on posts older than this many seconds are rejected.
    /// Disabled by default.
    pub vote_window_secs: Option<u64>,
}

impl Default for VoteConfig {
    fn default() -> Self {
        Self {
            marker_ttl_secs: 7 * 24 * 3600,
            vote_window_secs: None,
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `palaver.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `PALAVER_CONFIG` environment variable (if set)
    /// 4. Environment variables with `PALAVER` prefix
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        Ok(config)
    }

    /// Create config for testing (memory backend, short TTLs).
    pub fn for_test() -> Self {
        Self {
            storage: StorageConfig {
                storage_type: StorageType::Memory,
                ..StorageConfig::default()
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.storage.storage_type, StorageType::Redis);
        assert_eq!(config.storage.key_prefix, "palaver");
        assert_eq!(config.storage.scoped_index_ttl_secs, 60);
        assert_eq!(config.ranking.vote_weight, 432.0);
        assert_eq!(config.ranking.epoch_offset, 1_577_808_000);
        assert_eq!(config.paging.page_size, 20);
        assert_eq!(config.votes.marker_ttl_secs, 7 * 24 * 3600);
        assert!(config.votes.vote_window_secs.is_none());
    }

    #[test]
    fn test_config_for_test() {
        let config = Config::for_test();
        assert_eq!(config.storage.storage_type, StorageType::Memory);
    }
}
