//! Address normalization and the sentinel addresses the pipeline filters out.

use std::str::FromStr;

use alloy_primitives::{address, Address};

use crate::error::SyncError;

/// Placeholder many indexers use for the chain's gas token.
pub const NATIVE_PLACEHOLDER_ADDRESS: Address =
    address!("eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");

/// Addresses that stand in for the native asset rather than a real contract.
pub const ZERO_ADDRESSES: [Address; 2] = [Address::ZERO, NATIVE_PLACEHOLDER_ADDRESS];

/// Conventional burn address. Rows and quotes for it are never trusted.
pub const DEAD_ADDRESS: Address = address!("deaddeaddeaddeaddeaddeaddeaddeaddead0000");

pub fn is_zero_address(address: &Address) -> bool {
    ZERO_ADDRESSES.contains(address)
}

pub fn is_dead_address(address: &Address) -> bool {
    *address == DEAD_ADDRESS
}

/// True when a source row describes the native asset, either because the
/// source flagged it or because its address is a zero sentinel.
pub fn is_native_or_zero(native_flag: Option<bool>, address: &Address) -> bool {
    native_flag.unwrap_or(false) || is_zero_address(address)
}

/// Parse an account or contract address in any hex casing.
pub fn normalize_address(raw: &str) -> Result<Address, SyncError> {
    let trimmed = raw.trim();
    if !trimmed.starts_with("0x") && !trimmed.starts_with("0X") {
        return Err(SyncError::InvalidAddress {
            address: raw.to_string(),
        });
    }
    Address::from_str(&trimmed[2..]).map_err(|_| SyncError::InvalidAddress {
        address: raw.to_string(),
    })
}
