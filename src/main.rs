use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use assetsync::config::{default_config_path, ResolvedConfig};
use assetsync::duration::format_duration;
use assetsync::sources::{
    HttpIndexerClient, HttpPriceOracle, NoopPriceOracle, PriceOracle, RpcBalanceReader,
};
use assetsync::storage::JsonFileTokenRepository;
use assetsync::sync::{AssetSyncService, SyncContext};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "assetsync")]
#[command(about = "Reconcile on-chain token holdings")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show current configuration
    Config,

    /// Reconcile an account's assets and print the report
    Sync {
        #[arg(long)]
        chain: u64,
        #[arg(long)]
        account: String,
    },

    /// Print stored assets for an account
    List {
        #[arg(long)]
        chain: u64,
        #[arg(long)]
        account: String,
    },
}

fn build_service(config: &ResolvedConfig) -> Result<AssetSyncService> {
    let indexer_url = config
        .indexer
        .base_url
        .as_deref()
        .context("indexer.base_url is not configured")?;
    let indexer = HttpIndexerClient::new(indexer_url)
        .with_api_version(config.indexer.api_version.as_str())
        .with_supported_chains(config.indexer.chains.iter().copied());

    let prices: Arc<dyn PriceOracle> = match config.price_oracle.base_url.as_deref() {
        Some(url) => Arc::new(
            HttpPriceOracle::new(url).with_batch_size(config.price_oracle.batch_size),
        ),
        None => Arc::new(NoopPriceOracle),
    };

    let context = SyncContext::new(
        config.networks.clone(),
        Arc::new(indexer),
        Arc::new(RpcBalanceReader::new(config.networks.clone())),
        prices,
        Arc::new(JsonFileTokenRepository::new(&config.data_dir)),
    )
    .with_settings(config.sync.clone());

    Ok(AssetSyncService::new(context))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .json(),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = ResolvedConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    match cli.command {
        Command::Config => {
            println!("Config file: {}", config_path.display());
            println!("Data directory: {}", config.data_dir.display());
            println!(
                "Indexer: {}",
                config.indexer.base_url.as_deref().unwrap_or("(not configured)")
            );
            println!(
                "Price oracle: {}",
                config
                    .price_oracle
                    .base_url
                    .as_deref()
                    .unwrap_or("(not configured)")
            );
            println!("Reconcile TTL: {}", format_duration(config.sync.reconcile_ttl));
            println!("Indexer TTL: {}", format_duration(config.sync.indexer_ttl));
            println!(
                "Chain sync freshness: {}",
                format_duration(config.sync.chain_sync_freshness)
            );
            println!("Chain fallback limit: {}", config.sync.chain_fallback_limit);
            println!("Networks:");
            for network in config.networks.iter() {
                let rpc = network.rpc_url.as_deref().unwrap_or("-");
                println!("  {:>12}  {}  {}", network.chain_id, network.name, rpc);
            }
        }
        Command::Sync { chain, account } => {
            let service = build_service(&config)?;
            let report = service.sync_account_assets(chain, &account).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::List { chain, account } => {
            let service = build_service(&config)?;
            let tokens = service.account_tokens(chain, &account).await?;
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }
    }

    Ok(())
}
