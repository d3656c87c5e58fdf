//! Seams for the three upstream data sources.
//!
//! Each source is an independent, unreliable fetch. Implementations report
//! failures through `anyhow::Result`; the reconciler decides how to degrade.

mod chain;
mod indexer;
mod prices;

pub use chain::RpcBalanceReader;
pub use indexer::{HttpIndexerClient, INDEXER_CHAINS};
pub use prices::{HttpPriceOracle, NoopPriceOracle};

use std::collections::HashMap;
use std::str::FromStr;

use alloy_primitives::{Address, U256};
use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crate::models::TokenSlug;

/// One row of the indexer's per-address asset listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexerToken {
    pub contract_address: String,
    #[serde(default)]
    pub native_token: Option<bool>,
    /// Integer balance in base units.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub balance: String,
    #[serde(default)]
    pub contract_ticker_symbol: Option<String>,
    #[serde(default)]
    pub contract_name: Option<String>,
    /// `None` when missing or outside `u8`.
    #[serde(default, deserialize_with = "deserialize_opt_u8")]
    pub contract_decimals: Option<u8>,
    #[serde(default)]
    pub logo_url: Option<String>,
    /// USD value of the whole balance.
    #[serde(default, deserialize_with = "deserialize_opt_f64")]
    pub quote: Option<f64>,
    /// USD price of one token.
    #[serde(default, deserialize_with = "deserialize_opt_decimal")]
    pub quote_rate: Option<Decimal>,
    /// 24h price change in percent.
    #[serde(default, deserialize_with = "deserialize_opt_decimal")]
    pub quote_rate_24h: Option<Decimal>,
}

impl IndexerToken {
    /// Minimal row, mostly useful for tests and fixtures.
    pub fn new(contract_address: impl Into<String>, balance: impl Into<String>) -> Self {
        Self {
            contract_address: contract_address.into(),
            native_token: None,
            balance: balance.into(),
            contract_ticker_symbol: None,
            contract_name: None,
            contract_decimals: None,
            logo_url: None,
            quote: None,
            quote_rate: None,
            quote_rate_24h: None,
        }
    }

    pub fn with_metadata(
        mut self,
        symbol: impl Into<String>,
        name: impl Into<String>,
        decimals: u8,
    ) -> Self {
        self.contract_ticker_symbol = Some(symbol.into());
        self.contract_name = Some(name.into());
        self.contract_decimals = Some(decimals);
        self
    }

    pub fn with_quote_rate(mut self, rate: Decimal) -> Self {
        self.quote_rate = Some(rate);
        self
    }

    pub fn native(mut self) -> Self {
        self.native_token = Some(true);
        self
    }
}

/// USD quote for a single token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPrice {
    pub usd: Decimal,
    pub usd_24h_change: Option<Decimal>,
    /// Maximum USD value the market could absorb for this token.
    pub usd_reserve: Option<Decimal>,
}

impl TokenPrice {
    pub fn new(usd: Decimal) -> Self {
        Self {
            usd,
            usd_24h_change: None,
            usd_reserve: None,
        }
    }

    pub fn with_change(mut self, change: Decimal) -> Self {
        self.usd_24h_change = Some(change);
        self
    }

    pub fn with_reserve(mut self, reserve: Decimal) -> Self {
        self.usd_reserve = Some(reserve);
        self
    }
}

pub type PriceMap = HashMap<Address, TokenPrice>;

#[async_trait::async_trait]
pub trait IndexerSource: Send + Sync {
    async fn fetch_account_tokens(
        &self,
        chain_id: u64,
        account: Address,
    ) -> Result<Vec<IndexerToken>>;

    fn name(&self) -> &str;
}

#[async_trait::async_trait]
pub trait ChainBalanceSource: Send + Sync {
    /// `Ok(None)` means the balance is unavailable for this token.
    async fn fetch_balance(
        &self,
        chain_id: u64,
        token: &TokenSlug,
        account: Address,
    ) -> Result<Option<U256>>;

    fn name(&self) -> &str;
}

#[async_trait::async_trait]
pub trait PriceOracle: Send + Sync {
    async fn fetch_prices(&self, addresses: &[Address], chain_id: u64) -> Result<PriceMap>;

    fn name(&self) -> &str;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(serde_json::Number),
    Text(String),
}

impl NumberOrText {
    fn into_text(self) -> String {
        match self {
            NumberOrText::Number(n) => n.to_string(),
            NumberOrText::Text(s) => s,
        }
    }
}

pub(crate) fn decimal_from_text(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(value.map(NumberOrText::into_text).unwrap_or_default())
}

pub(crate) fn deserialize_opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(value.and_then(|v| decimal_from_text(&v.into_text())))
}

fn deserialize_opt_u8<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.into_text().trim().parse::<u8>().ok()))
}

fn deserialize_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.into_text().trim().parse::<f64>().ok()))
}
