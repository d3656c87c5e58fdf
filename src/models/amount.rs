//! Base-unit balances and their USD valuation.

use std::str::FromStr;

use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Parse an integer balance in base units.
///
/// Fractional values are rounded half-up; negative or unparsable values
/// return `None`.
pub fn parse_raw_balance(raw: &str) -> Option<U256> {
    let raw = raw.trim();
    if let Ok(value) = U256::from_str_radix(raw, 10) {
        return Some(value);
    }

    let decimal = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()?;
    if decimal.is_sign_negative() && !decimal.is_zero() {
        return None;
    }
    let rounded = decimal.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    U256::from_str_radix(&rounded.trunc().to_string(), 10).ok()
}

/// Convert a base-unit balance to whole token units.
pub fn token_units(raw: U256, decimals: u8) -> f64 {
    let digits = raw.to_string();
    let decimals = usize::from(decimals);

    let text = if decimals == 0 {
        digits
    } else if digits.len() > decimals {
        let (whole, fraction) = digits.split_at(digits.len() - decimals);
        format!("{whole}.{fraction}")
    } else {
        format!("0.{}{digits}", "0".repeat(decimals - digits.len()))
    };

    text.parse::<f64>().unwrap_or(0.0)
}

/// USD value of a balance at `price`, clamped to a finite non-negative number.
pub fn usd_value(raw: U256, decimals: u8, price: Decimal) -> f64 {
    let price = price.to_f64().unwrap_or(0.0);
    sanitize_usd(token_units(raw, decimals) * price)
}

/// Apply the liquidity reserve ceiling a price source may report.
pub fn cap_at_reserve(balance_usd: f64, reserve: Option<Decimal>) -> f64 {
    match reserve.and_then(|r| r.to_f64()) {
        Some(ceiling) => sanitize_usd(balance_usd.min(ceiling)),
        None => sanitize_usd(balance_usd),
    }
}

pub fn sanitize_usd(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Canonical string form of a price ("2.0" becomes "2").
pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Serde adapter storing `U256` as a base-10 string.
pub mod u256_decimal {
    use alloy_primitives::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        U256::from_str_radix(s.trim(), 10).map_err(de::Error::custom)
    }
}
