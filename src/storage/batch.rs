use std::collections::HashMap;

use anyhow::Result;
use tracing::debug;

use crate::models::{TokenRecord, TokenSlug};

use super::{TokenRepository, TokenScope};

/// Snapshot of an account's token set plus the writes staged against it.
///
/// Staged records start out as a copy of the snapshot, so every pass sees the
/// cumulative result of the passes before it. Nothing reaches the repository
/// until [`TokenSyncBatch::commit`].
#[derive(Debug, Clone)]
pub struct TokenSyncBatch {
    scope: TokenScope,
    existing: Vec<TokenRecord>,
    existing_index: HashMap<TokenSlug, usize>,
    staged: Vec<TokenRecord>,
    staged_index: HashMap<TokenSlug, usize>,
}

impl TokenSyncBatch {
    /// Read the current snapshot for `scope` from the repository.
    pub async fn prepare(repository: &dyn TokenRepository, scope: TokenScope) -> Result<Self> {
        let records = repository.load_tokens(&scope).await?;
        Ok(Self::from_snapshot(scope, records))
    }

    pub fn from_snapshot(scope: TokenScope, records: Vec<TokenRecord>) -> Self {
        // Last write wins for duplicate slugs.
        let mut existing: Vec<TokenRecord> = Vec::with_capacity(records.len());
        let mut existing_index: HashMap<TokenSlug, usize> = HashMap::new();
        for record in records {
            if let Some(idx) = existing_index.get(&record.token_slug).copied() {
                existing[idx] = record;
            } else {
                existing_index.insert(record.token_slug.clone(), existing.len());
                existing.push(record);
            }
        }

        Self {
            scope,
            staged: existing.clone(),
            staged_index: existing_index.clone(),
            existing,
            existing_index,
        }
    }

    pub fn scope(&self) -> &TokenScope {
        &self.scope
    }

    /// The record as it was when the snapshot was taken.
    pub fn existing(&self, slug: &TokenSlug) -> Option<&TokenRecord> {
        self.existing_index.get(slug).map(|&idx| &self.existing[idx])
    }

    pub fn existing_records(&self) -> &[TokenRecord] {
        &self.existing
    }

    /// The record as currently staged.
    pub fn staged(&self, slug: &TokenSlug) -> Option<&TokenRecord> {
        self.staged_index.get(slug).map(|&idx| &self.staged[idx])
    }

    pub fn staged_records(&self) -> &[TokenRecord] {
        &self.staged
    }

    pub fn staged_records_mut(&mut self) -> &mut [TokenRecord] {
        &mut self.staged
    }

    /// Stage an upsert, replacing any staged record with the same slug.
    pub fn stage(&mut self, record: TokenRecord) {
        debug_assert_eq!(record.chain_id, self.scope.chain_id);
        debug_assert_eq!(record.account_address, self.scope.account);

        match self.staged_index.get(&record.token_slug).copied() {
            Some(idx) => self.staged[idx] = record,
            None => {
                self.staged_index
                    .insert(record.token_slug.clone(), self.staged.len());
                self.staged.push(record);
            }
        }
    }

    /// Staged records that differ from the snapshot.
    pub fn changes(&self) -> Vec<TokenRecord> {
        self.staged
            .iter()
            .filter(|record| self.existing(&record.token_slug) != Some(*record))
            .cloned()
            .collect()
    }

    /// Write the staged delta. Returns the number of records written.
    pub async fn commit(self, repository: &dyn TokenRepository) -> Result<usize> {
        let changes = self.changes();
        if changes.is_empty() {
            debug!(chain_id = self.scope.chain_id, "no token changes to commit");
            return Ok(0);
        }

        repository.commit_tokens(&self.scope, &changes).await?;
        Ok(changes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::normalize_address;
    use alloy_primitives::U256;

    fn record(token: &str, balance: u64) -> TokenRecord {
        let account = normalize_address("0x1111111111111111111111111111111111111111").unwrap();
        let token = normalize_address(token).unwrap();
        let mut record = TokenRecord::new_asset(1, account, TokenSlug::erc20(token));
        record.raw_balance = U256::from(balance);
        record
    }

    fn scope() -> TokenScope {
        let account = normalize_address("0x1111111111111111111111111111111111111111").unwrap();
        TokenScope::assets(1, account)
    }

    const TOKEN_A: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
    const TOKEN_B: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";

    #[test]
    fn staged_starts_as_snapshot() {
        let batch = TokenSyncBatch::from_snapshot(scope(), vec![record(TOKEN_A, 5)]);
        assert_eq!(batch.staged_records().len(), 1);
        assert!(batch.changes().is_empty());
    }

    #[test]
    fn duplicate_snapshot_slugs_keep_last() {
        let batch = TokenSyncBatch::from_snapshot(
            scope(),
            vec![record(TOKEN_A, 5), record(TOKEN_A, 9)],
        );
        assert_eq!(batch.existing_records().len(), 1);
        assert_eq!(batch.existing_records()[0].raw_balance, U256::from(9u64));
    }

    #[test]
    fn stage_replaces_and_appends() {
        let mut batch = TokenSyncBatch::from_snapshot(scope(), vec![record(TOKEN_A, 5)]);
        batch.stage(record(TOKEN_A, 7));
        batch.stage(record(TOKEN_B, 1));

        assert_eq!(batch.staged_records().len(), 2);
        let slug = record(TOKEN_A, 0).token_slug;
        assert_eq!(batch.staged(&slug).unwrap().raw_balance, U256::from(7u64));
        assert_eq!(batch.existing(&slug).unwrap().raw_balance, U256::from(5u64));
        assert_eq!(batch.changes().len(), 2);
    }
}
