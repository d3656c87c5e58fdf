mod batch;
mod json_file;
mod memory;

pub use batch::TokenSyncBatch;
pub use json_file::JsonFileTokenRepository;
pub use memory::MemoryTokenRepository;

use alloy_primitives::Address;
use anyhow::Result;

use crate::models::{TokenRecord, TokenType};

/// Which token set a repository operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenScope {
    pub chain_id: u64,
    pub account: Address,
    pub token_type: TokenType,
}

impl TokenScope {
    pub fn assets(chain_id: u64, account: Address) -> Self {
        Self {
            chain_id,
            account,
            token_type: TokenType::Asset,
        }
    }
}

/// Durable store of token records.
#[async_trait::async_trait]
pub trait TokenRepository: Send + Sync {
    /// Snapshot of every record in the scope.
    async fn load_tokens(&self, scope: &TokenScope) -> Result<Vec<TokenRecord>>;

    /// Upsert `records` by slug. Either all records land or none do.
    async fn commit_tokens(&self, scope: &TokenScope, records: &[TokenRecord]) -> Result<()>;
}

/// Replace records with matching slugs and append the rest.
pub(crate) fn upsert_by_slug(current: &mut Vec<TokenRecord>, records: &[TokenRecord]) {
    for record in records {
        match current
            .iter_mut()
            .find(|existing| existing.token_slug == record.token_slug)
        {
            Some(existing) => *existing = record.clone(),
            None => current.push(record.clone()),
        }
    }
}
