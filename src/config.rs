use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::duration::{deserialize_duration, serialize_duration};
use crate::models::{Network, Networks};
use crate::sources::INDEXER_CHAINS;

/// Default reconciliation memo lifetime (40 seconds).
fn default_reconcile_ttl() -> Duration {
    Duration::from_secs(40)
}

/// Default indexer fetch memo lifetime (10 seconds).
fn default_indexer_ttl() -> Duration {
    Duration::from_secs(10)
}

/// Default window in which a chain-read balance outranks the indexer (3 minutes).
fn default_chain_sync_freshness() -> Duration {
    Duration::from_secs(3 * 60)
}

fn default_chain_fallback_limit() -> usize {
    200
}

fn default_api_version() -> String {
    "u/v1".to_string()
}

fn default_indexer_chains() -> Vec<u64> {
    INDEXER_CHAINS.to_vec()
}

fn default_price_batch_size() -> usize {
    100
}

/// Reconciliation timing and fan-out limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// How long a reconciliation result is reused for the same account.
    #[serde(
        default = "default_reconcile_ttl",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub reconcile_ttl: Duration,

    /// How long a raw indexer response is reused for the same account.
    #[serde(
        default = "default_indexer_ttl",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub indexer_ttl: Duration,

    /// A token read from the chain more recently than this is not
    /// overwritten by indexer data.
    #[serde(
        default = "default_chain_sync_freshness",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub chain_sync_freshness: Duration,

    /// Direct chain reads are skipped entirely when an account holds this
    /// many tokens or more.
    #[serde(default = "default_chain_fallback_limit")]
    pub chain_fallback_limit: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reconcile_ttl: default_reconcile_ttl(),
            indexer_ttl: default_indexer_ttl(),
            chain_sync_freshness: default_chain_sync_freshness(),
            chain_fallback_limit: default_chain_fallback_limit(),
        }
    }
}

/// Indexer endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub base_url: Option<String>,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Chain ids the indexer serves.
    #[serde(default = "default_indexer_chains")]
    pub chains: Vec<u64>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_version: default_api_version(),
            chains: default_indexer_chains(),
        }
    }
}

/// Price oracle endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceOracleConfig {
    /// When unset, reconciliation runs without price updates.
    pub base_url: Option<String>,

    #[serde(default = "default_price_batch_size")]
    pub batch_size: usize,
}

impl Default for PriceOracleConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            batch_size: default_price_batch_size(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to data directory. If relative, resolved from config file location.
    /// If not specified, defaults to the config file's directory.
    pub data_dir: Option<PathBuf>,

    pub sync: SyncConfig,

    pub indexer: IndexerConfig,

    pub price_oracle: PriceOracleConfig,

    /// Network entries added to, or replacing, the built-in directory.
    pub networks: Vec<Network>,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the data directory path relative to `config_dir`.
    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }

    /// Built-in networks with configured overrides applied.
    pub fn networks(&self) -> Networks {
        Networks::builtin().with_overrides(self.networks.iter().cloned())
    }
}

/// Loaded configuration with resolved paths.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub data_dir: PathBuf,
    pub sync: SyncConfig,
    pub indexer: IndexerConfig,
    pub price_oracle: PriceOracleConfig,
    pub networks: Networks,
}

impl ResolvedConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config = Config::load(path)?;
        Ok(Self::resolve(config, path))
    }

    pub fn load_or_default(path: &Path) -> Result<Self> {
        let config = Config::load_or_default(path)?;
        Ok(Self::resolve(config, path))
    }

    fn resolve(config: Config, path: &Path) -> Self {
        let config_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        Self {
            data_dir: config.resolve_data_dir(config_dir),
            networks: config.networks(),
            sync: config.sync,
            indexer: config.indexer,
            price_oracle: config.price_oracle,
        }
    }
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./assetsync.toml` if it exists in current directory
/// 2. `~/.local/share/assetsync/assetsync.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("assetsync.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("assetsync").join("assetsync.toml");
    }

    local_config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reconciliation_windows() {
        let config = Config::default();
        assert_eq!(config.sync.reconcile_ttl, Duration::from_secs(40));
        assert_eq!(config.sync.indexer_ttl, Duration::from_secs(10));
        assert_eq!(config.sync.chain_sync_freshness, Duration::from_secs(180));
        assert_eq!(config.sync.chain_fallback_limit, 200);
        assert_eq!(config.indexer.api_version, "u/v1");
        assert!(config.indexer.chains.contains(&1));
        assert!(config.price_oracle.base_url.is_none());
    }

    #[test]
    fn resolve_relative_data_dir() {
        let config = Config {
            data_dir: Some(PathBuf::from("data")),
            ..Config::default()
        };
        assert_eq!(
            config.resolve_data_dir(Path::new("/etc/assetsync")),
            PathBuf::from("/etc/assetsync/data")
        );
    }

    #[test]
    fn resolved_config_without_parent_uses_current_dir() {
        let resolved = ResolvedConfig::resolve(Config::default(), Path::new("assetsync.toml"));
        assert_eq!(resolved.data_dir, PathBuf::from("."));
    }
}
