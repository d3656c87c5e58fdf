//! Direct ERC-20 balance reads over JSON-RPC.

use alloy_primitives::{hex, Address, U256};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::json;

use super::ChainBalanceSource;
use crate::models::{Networks, TokenSlug, TokenStandard};

/// `balanceOf(address)` selector.
const BALANCE_OF_SELECTOR: &str = "70a08231";

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Reads token balances with `eth_call` against each network's RPC endpoint.
///
/// Networks without an RPC endpoint, non-ERC20 slugs and empty call results
/// all yield `Ok(None)`.
pub struct RpcBalanceReader {
    client: reqwest::Client,
    networks: Networks,
}

impl RpcBalanceReader {
    pub fn new(networks: Networks) -> Self {
        Self::with_client(reqwest::Client::new(), networks)
    }

    pub fn with_client(client: reqwest::Client, networks: Networks) -> Self {
        Self { client, networks }
    }
}

fn balance_of_calldata(account: Address) -> String {
    format!(
        "0x{BALANCE_OF_SELECTOR}{:0>64}",
        hex::encode(account.as_slice())
    )
}

fn decode_balance(result: &str) -> Result<Option<U256>> {
    let digits = result.trim().trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(None);
    }
    // Only the first word is the return value.
    let word = digits.get(..digits.len().min(64)).unwrap_or(digits);
    U256::from_str_radix(word, 16)
        .map(Some)
        .with_context(|| format!("Malformed balanceOf result: {result}"))
}

#[async_trait::async_trait]
impl ChainBalanceSource for RpcBalanceReader {
    async fn fetch_balance(
        &self,
        chain_id: u64,
        token: &TokenSlug,
        account: Address,
    ) -> Result<Option<U256>> {
        if token.standard() != TokenStandard::Erc20 {
            return Ok(None);
        }
        let network = self.networks.get(chain_id)?;
        let Some(rpc_url) = network.rpc_url.as_deref() else {
            return Ok(None);
        };

        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                {
                    "to": token.address().to_checksum(None),
                    "data": balance_of_calldata(account),
                },
                "latest"
            ],
        });

        let response = self
            .client
            .post(rpc_url)
            .json(&body)
            .send()
            .await
            .context("RPC request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("RPC error: {} - {}", status, body));
        }

        let payload: RpcResponse = response
            .json()
            .await
            .context("Failed to decode RPC response")?;

        if let Some(error) = payload.error {
            return Err(anyhow!("eth_call failed ({}): {}", error.code, error.message));
        }

        match payload.result {
            Some(result) => decode_balance(&result),
            None => Ok(None),
        }
    }

    fn name(&self) -> &str {
        "rpc"
    }
}
