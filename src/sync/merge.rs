//! Field-level merge rules for reconciliation.
//!
//! Every "fall back to what we already had" decision goes through
//! [`merge_field`] or [`merge_optional`] so the precedence (incoming, then
//! existing, then default) stays the same everywhere.

use alloy_primitives::{Address, U256};

use crate::models::amount::{cap_at_reserve, format_decimal, sanitize_usd, usd_value};
use crate::models::{
    is_dead_address, Network, TokenRecord, TokenStatus, DEFAULT_DECIMALS, DEFAULT_NAME,
    DEFAULT_SYMBOL,
};
use crate::sources::{decimal_from_text, IndexerToken, TokenPrice};

const MAX_SYMBOL_CHARS: usize = 8;

/// Incoming value, else existing value, else `default`.
pub fn merge_field<T>(incoming: Option<T>, existing: Option<T>, default: T) -> T {
    incoming.or(existing).unwrap_or(default)
}

/// Incoming value, else existing value.
pub fn merge_optional<T>(incoming: Option<T>, existing: Option<T>) -> Option<T> {
    incoming.or(existing)
}

/// Empty strings count as missing.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn truncate_symbol(symbol: &str) -> String {
    symbol.chars().take(MAX_SYMBOL_CHARS).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub logo_url: Option<String>,
}

pub fn merge_metadata(
    row: &IndexerToken,
    existing: Option<&TokenRecord>,
    network: &Network,
) -> TokenMetadata {
    let symbol = merge_field(
        non_empty(row.contract_ticker_symbol.as_deref()).map(truncate_symbol),
        existing.map(|e| e.symbol.clone()).filter(|s| !s.is_empty()),
        DEFAULT_SYMBOL.to_string(),
    );
    let name = merge_field(
        non_empty(row.contract_name.as_deref()).map(str::to_string),
        existing.map(|e| e.name.clone()).filter(|s| !s.is_empty()),
        DEFAULT_NAME.to_string(),
    );
    let decimals = merge_field(
        row.contract_decimals,
        existing.map(|e| e.decimals),
        DEFAULT_DECIMALS,
    );
    // Mainnet logos come from the indexer only; testnets keep whatever we had.
    let logo_url = if network.is_mainnet() {
        non_empty(row.logo_url.as_deref()).map(str::to_string)
    } else {
        existing.and_then(|e| e.logo_url.clone())
    };

    TokenMetadata {
        symbol,
        name,
        decimals,
        logo_url,
    }
}

/// Mainnet rows need a symbol and non-zero decimals to be trusted.
pub fn has_trusted_metadata(row: &IndexerToken) -> bool {
    non_empty(row.contract_ticker_symbol.as_deref()).is_some()
        && row.contract_decimals.is_some_and(|d| d > 0)
}

/// Policy skips for an indexer row that survived native filtering and the
/// freshness check.
pub fn skip_indexer_row(
    row: &IndexerToken,
    address: &Address,
    has_existing: bool,
    raw_balance: U256,
    network: &Network,
) -> bool {
    // New zero-balance tokens are not created, while existing ones are kept
    // and later disabled by the price pass.
    (!has_existing && raw_balance.is_zero())
        || (network.is_mainnet() && !has_trusted_metadata(row))
        || is_dead_address(address)
}

/// USD value for an indexer row: the row's own quote, else balance times
/// price, else the previous value.
pub fn indexer_balance_usd(
    row_quote: Option<f64>,
    raw_balance: U256,
    decimals: u8,
    price_usd: Option<&str>,
    existing_balance_usd: Option<f64>,
) -> f64 {
    if let Some(quote) = row_quote.filter(|q| q.is_finite() && *q > 0.0) {
        return quote;
    }
    if let Some(price) = price_usd.and_then(decimal_from_text) {
        return usd_value(raw_balance, decimals, price);
    }
    sanitize_usd(existing_balance_usd.unwrap_or(0.0))
}

/// Build the record an indexer row stages: the existing record (or `fresh`
/// for a first sighting) with merged metadata and volumes.
pub fn merge_indexer_row(
    row: &IndexerToken,
    raw_balance: U256,
    existing: Option<&TokenRecord>,
    network: &Network,
    fresh: impl FnOnce() -> TokenRecord,
) -> TokenRecord {
    let metadata = merge_metadata(row, existing, network);

    let price_usd = merge_optional(
        row.quote_rate
            .filter(|rate| !rate.is_zero())
            .map(format_decimal),
        existing.and_then(|e| e.price_usd.clone()),
    );
    let price_usd_change_24h = merge_optional(
        row.quote_rate_24h.map(format_decimal),
        existing.and_then(|e| e.price_usd_change_24h.clone()),
    );
    let balance_usd = indexer_balance_usd(
        row.quote,
        raw_balance,
        metadata.decimals,
        price_usd.as_deref(),
        existing.map(|e| e.balance_usd),
    );

    let mut record = existing.cloned().unwrap_or_else(fresh);
    record.symbol = metadata.symbol;
    record.name = metadata.name;
    record.decimals = metadata.decimals;
    record.logo_url = metadata.logo_url;
    record.raw_balance = raw_balance;
    record.price_usd = price_usd;
    record.price_usd_change_24h = price_usd_change_24h;
    record.balance_usd = balance_usd;
    record
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceOutcome {
    /// A quote was applied.
    Priced,
    /// No usable quote; price fields cleared.
    Unpriced,
    /// Dead address without a quote; price fields left as they were.
    Skipped,
}

/// Apply a price oracle quote to a staged record and auto-toggle its status.
///
/// This is the only place status changes automatically, and never for
/// records the user toggled by hand.
pub fn apply_quote(record: &mut TokenRecord, quote: Option<&TokenPrice>) -> PriceOutcome {
    let quote = quote.filter(|q| q.usd.is_sign_positive() && !q.usd.is_zero());
    let outcome = match quote {
        Some(quote) => {
            record.price_usd = Some(format_decimal(quote.usd));
            record.price_usd_change_24h = quote.usd_24h_change.map(format_decimal);
            record.balance_usd = cap_at_reserve(
                usd_value(record.raw_balance, record.decimals, quote.usd),
                quote.usd_reserve,
            );
            PriceOutcome::Priced
        }
        None if is_dead_address(&record.token_address()) => PriceOutcome::Skipped,
        None => {
            record.balance_usd = 0.0;
            record.price_usd = None;
            record.price_usd_change_24h = None;
            PriceOutcome::Unpriced
        }
    };

    if !record.manually_status_changed {
        record.status = if record.has_balance() {
            TokenStatus::Enabled
        } else {
            TokenStatus::Disabled
        };
    }

    outcome
}
