//! Batched USD quotes from a price oracle service.

use std::collections::HashMap;

use alloy_primitives::Address;
use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{deserialize_opt_decimal, PriceMap, PriceOracle, TokenPrice};
use crate::models::normalize_address;

const DEFAULT_BATCH_SIZE: usize = 100;
const USER_AGENT: &str = concat!("assetsync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct QuoteEntry {
    #[serde(default, deserialize_with = "deserialize_opt_decimal")]
    usd: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_opt_decimal")]
    usd_24h_change: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_opt_decimal")]
    usd_reserve: Option<Decimal>,
}

/// Price oracle reached over HTTP.
///
/// `GET {base}/prices?chainId={id}&addresses={a,b,...}` answers with a JSON
/// object keyed by token address. Large address lists are split into batches
/// fetched concurrently; the call only fails when every batch fails.
pub struct HttpPriceOracle {
    client: reqwest::Client,
    base_url: String,
    batch_size: usize,
}

impl HttpPriceOracle {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    async fn fetch_batch(&self, addresses: &[Address], chain_id: u64) -> Result<PriceMap> {
        let joined = addresses
            .iter()
            .map(|a| a.to_checksum(None))
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/prices", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("chainId", chain_id.to_string()), ("addresses", joined)])
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .context("Price oracle request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Price oracle API error: {} - {}", status, body));
        }

        let raw: HashMap<String, QuoteEntry> = response
            .json()
            .await
            .context("Failed to decode price oracle response")?;

        let mut prices = PriceMap::with_capacity(raw.len());
        for (key, entry) in raw {
            let Ok(address) = normalize_address(&key) else {
                debug!(key = %key, "ignoring quote with malformed address");
                continue;
            };
            let Some(usd) = entry.usd else {
                continue;
            };
            prices.insert(
                address,
                TokenPrice {
                    usd,
                    usd_24h_change: entry.usd_24h_change,
                    usd_reserve: entry.usd_reserve,
                },
            );
        }
        Ok(prices)
    }
}

#[async_trait::async_trait]
impl PriceOracle for HttpPriceOracle {
    async fn fetch_prices(&self, addresses: &[Address], chain_id: u64) -> Result<PriceMap> {
        if addresses.is_empty() {
            return Ok(PriceMap::new());
        }

        let batches = addresses.chunks(self.batch_size);
        let total = batches.len();
        let results = join_all(batches.map(|batch| self.fetch_batch(batch, chain_id))).await;

        let mut prices = PriceMap::new();
        let mut failures = 0usize;
        let mut last_error = None;
        for result in results {
            match result {
                Ok(batch) => prices.extend(batch),
                Err(err) => {
                    warn!(chain_id, error = %format!("{err:#}"), "price batch failed");
                    failures += 1;
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(err) if failures == total => Err(err),
            _ => Ok(prices),
        }
    }

    fn name(&self) -> &str {
        "price-oracle"
    }
}

/// Oracle that never knows a price. Leaves prices untouched when no oracle is
/// configured.
pub struct NoopPriceOracle;

#[async_trait::async_trait]
impl PriceOracle for NoopPriceOracle {
    async fn fetch_prices(&self, _addresses: &[Address], _chain_id: u64) -> Result<PriceMap> {
        Ok(PriceMap::new())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
