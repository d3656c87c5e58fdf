use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::{anyhow, Result};

use crate::clock::Clock;
use crate::memo::{cache_key, TtlMemo};
use crate::sources::{IndexerSource, IndexerToken};

/// Indexer wrapper that reuses a response for the same chain and account
/// within a short window, and folds concurrent requests into one.
pub struct MemoizedIndexer {
    inner: Arc<dyn IndexerSource>,
    memo: TtlMemo<Vec<IndexerToken>, Arc<anyhow::Error>>,
}

impl MemoizedIndexer {
    pub fn new(inner: Arc<dyn IndexerSource>, ttl: Duration) -> Self {
        Self {
            inner,
            memo: TtlMemo::new("indexer", ttl),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.memo = self.memo.with_clock(clock);
        self
    }

    pub fn clear(&self) {
        self.memo.clear();
    }
}

#[async_trait::async_trait]
impl IndexerSource for MemoizedIndexer {
    async fn fetch_account_tokens(
        &self,
        chain_id: u64,
        account: Address,
    ) -> Result<Vec<IndexerToken>> {
        let key = cache_key([chain_id.to_string(), account.to_checksum(None)]);
        let inner = Arc::clone(&self.inner);

        self.memo
            .get_or_run(&key, move || async move {
                inner
                    .fetch_account_tokens(chain_id, account)
                    .await
                    .map_err(Arc::new)
            })
            .await
            .map_err(|err| anyhow!("{err:#}"))
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
