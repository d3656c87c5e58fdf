//! HTTP client for the third-party asset indexer.

use std::collections::HashSet;

use alloy_primitives::Address;
use anyhow::{anyhow, Context, Result};
use tracing::debug;

use super::{IndexerSource, IndexerToken};

const DEFAULT_API_VERSION: &str = "u/v1";
const USER_AGENT: &str = concat!("assetsync/", env!("CARGO_PKG_VERSION"));

/// Chains the indexer serves. Requests for anything else fail immediately.
pub const INDEXER_CHAINS: [u64; 22] = [
    1, 56, 137, 42220, 8217, 25, 106, 42161, 43114, 50, 32769, 250, 122, 1313161554, 1088, 5000,
    1101, 1284, 10, 8453, 34443, 169,
];

pub struct HttpIndexerClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    supported_chains: HashSet<u64>,
}

impl HttpIndexerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            supported_chains: INDEXER_CHAINS.into_iter().collect(),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into().trim_matches('/').to_string();
        self
    }

    pub fn with_supported_chains(mut self, chains: impl IntoIterator<Item = u64>) -> Self {
        self.supported_chains = chains.into_iter().collect();
        self
    }

    pub fn supports(&self, chain_id: u64) -> bool {
        self.supported_chains.contains(&chain_id)
    }
}

#[async_trait::async_trait]
impl IndexerSource for HttpIndexerClient {
    async fn fetch_account_tokens(
        &self,
        chain_id: u64,
        account: Address,
    ) -> Result<Vec<IndexerToken>> {
        if !self.supports(chain_id) {
            return Err(anyhow!("Chain not supported by indexer: {chain_id}"));
        }

        let account = account.to_checksum(None);
        let url = format!(
            "{}/{}/{}/address/{}/assets",
            self.base_url, self.api_version, chain_id, account
        );
        debug!(chain_id, account = %account, "fetching indexer assets");

        let response = self
            .client
            .get(&url)
            .query(&[("_authAddress", account.as_str()), ("verified", "true")])
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .context("Indexer request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Indexer API error: {} - {}", status, body));
        }

        let tokens: Vec<IndexerToken> = response
            .json()
            .await
            .context("Failed to decode indexer response")?;
        Ok(tokens)
    }

    fn name(&self) -> &str {
        "indexer"
    }
}
