use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::amount::u256_decimal;
use super::TokenSlug;

pub const DEFAULT_SYMBOL: &str = "NONAME";
pub const DEFAULT_NAME: &str = "Unknown";
pub const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Asset,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Asset => "asset",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    Enabled,
    Disabled,
}

/// One fungible token held by one account on one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub chain_id: u64,
    pub account_address: Address,
    pub token_slug: TokenSlug,
    pub token_type: TokenType,
    pub status: TokenStatus,

    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,

    /// Balance in base units.
    #[serde(with = "u256_decimal")]
    pub raw_balance: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_usd_change_24h: Option<String>,
    #[serde(default)]
    pub balance_usd: f64,

    /// Set only when `raw_balance` came from a direct chain read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_by_chain_at: Option<DateTime<Utc>>,
    /// The user toggled `status` by hand; automatic toggling is frozen.
    #[serde(default)]
    pub manually_status_changed: bool,
}

impl TokenRecord {
    /// A first-seen asset record with default metadata and no balance.
    pub fn new_asset(chain_id: u64, account_address: Address, token_slug: TokenSlug) -> Self {
        Self {
            chain_id,
            account_address,
            token_slug,
            token_type: TokenType::Asset,
            status: TokenStatus::Enabled,
            symbol: DEFAULT_SYMBOL.to_string(),
            name: DEFAULT_NAME.to_string(),
            decimals: DEFAULT_DECIMALS,
            logo_url: None,
            raw_balance: U256::ZERO,
            price_usd: None,
            price_usd_change_24h: None,
            balance_usd: 0.0,
            synced_by_chain_at: None,
            manually_status_changed: false,
        }
    }

    pub fn token_address(&self) -> Address {
        self.token_slug.address()
    }

    pub fn has_balance(&self) -> bool {
        !self.raw_balance.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::normalize_address;

    #[test]
    fn serializes_balance_as_decimal_string() {
        let account = normalize_address("0x1111111111111111111111111111111111111111").unwrap();
        let token = normalize_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").unwrap();
        let mut record = TokenRecord::new_asset(1, account, TokenSlug::erc20(token));
        record.raw_balance = U256::from_str_radix("1500000000000000000", 10).unwrap();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["raw_balance"], "1500000000000000000");
        assert_eq!(value["status"], "enabled");
        assert!(value.get("price_usd").is_none());

        let back: TokenRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
