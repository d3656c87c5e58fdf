//! Integration tests for config loading.

use std::time::Duration;

use assetsync::config::{Config, ResolvedConfig};
use assetsync::models::NetworkKind;

#[test]
fn test_parse_full_config() {
    let toml = r#"
data_dir = "data"

[sync]
reconcile_ttl = "1m"
indexer_ttl = "5s"
chain_sync_freshness = "10m"
chain_fallback_limit = 50

[indexer]
base_url = "https://indexer.example"
api_version = "v2"
chains = [1, 56]

[price_oracle]
base_url = "https://prices.example"
batch_size = 25

[[networks]]
chain_id = 1
name = "Ethereum"
kind = "mainnet"
rpc_url = "http://localhost:8545"

[[networks]]
chain_id = 31337
name = "Local"
kind = "testnet"
"#;

    let config: Config = toml::from_str(toml).unwrap();
    assert_eq!(config.sync.reconcile_ttl, Duration::from_secs(60));
    assert_eq!(config.sync.indexer_ttl, Duration::from_secs(5));
    assert_eq!(config.sync.chain_sync_freshness, Duration::from_secs(600));
    assert_eq!(config.sync.chain_fallback_limit, 50);
    assert_eq!(config.indexer.chains, vec![1, 56]);
    assert_eq!(config.price_oracle.batch_size, 25);

    let networks = config.networks();
    assert_eq!(
        networks.get(1).unwrap().rpc_url.as_deref(),
        Some("http://localhost:8545")
    );
    assert_eq!(networks.get(31337).unwrap().kind, NetworkKind::Testnet);
}

#[test]
fn test_partial_sync_section_keeps_defaults() {
    let toml = r#"
[sync]
indexer_ttl = "30s"
"#;

    let config: Config = toml::from_str(toml).unwrap();
    assert_eq!(config.sync.indexer_ttl, Duration::from_secs(30));
    assert_eq!(config.sync.reconcile_ttl, Duration::from_secs(40));
    assert_eq!(config.sync.chain_sync_freshness, Duration::from_secs(180));
    assert_eq!(config.sync.chain_fallback_limit, 200);
}

#[test]
fn test_invalid_duration_is_rejected() {
    let toml = r#"
[sync]
reconcile_ttl = "forever"
"#;

    assert!(toml::from_str::<Config>(toml).is_err());
}

#[test]
fn test_resolved_config_from_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("assetsync.toml");
    std::fs::write(&path, "data_dir = \"store\"\n").unwrap();

    let resolved = ResolvedConfig::load(&path).unwrap();
    assert_eq!(resolved.data_dir, dir.path().join("store"));
    assert!(resolved.networks.get(1).is_ok());

    let missing = ResolvedConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(missing.data_dir, dir.path());
}
