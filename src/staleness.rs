//! Freshness of balances read directly from the chain.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::TokenRecord;

/// Result of a staleness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StalenessCheck {
    pub is_stale: bool,
    pub age: Option<Duration>,
    pub threshold: Duration,
}

impl StalenessCheck {
    pub fn stale(age: Duration, threshold: Duration) -> Self {
        Self {
            is_stale: true,
            age: Some(age),
            threshold,
        }
    }

    pub fn fresh(age: Duration, threshold: Duration) -> Self {
        Self {
            is_stale: false,
            age: Some(age),
            threshold,
        }
    }

    pub fn missing(threshold: Duration) -> Self {
        Self {
            is_stale: true,
            age: None,
            threshold,
        }
    }
}

/// Whether a record's chain-read balance is recent enough that a slower
/// indexer pass must not overwrite it.
///
/// A timestamp in the future (clock skew) counts as fresh.
pub fn check_chain_sync_freshness(
    record: &TokenRecord,
    threshold: Duration,
    now: DateTime<Utc>,
) -> StalenessCheck {
    match record.synced_by_chain_at {
        Some(synced_at) => {
            let age = (now - synced_at).to_std().unwrap_or(Duration::ZERO);
            if age >= threshold {
                StalenessCheck::stale(age, threshold)
            } else {
                StalenessCheck::fresh(age, threshold)
            }
        }
        None => StalenessCheck::missing(threshold),
    }
}

pub fn log_chain_sync_freshness(token_slug: &str, check: &StalenessCheck) {
    let status = if check.is_stale { "stale" } else { "fresh" };
    let age_str = check
        .age
        .map(crate::duration::format_duration)
        .unwrap_or_else(|| "never".to_string());

    debug!(
        token = token_slug,
        age = %age_str,
        threshold = %crate::duration::format_duration(check.threshold),
        status = status,
        "chain sync freshness check"
    );
}
