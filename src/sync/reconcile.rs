//! Three-source reconciliation of an account's asset list.

use std::sync::Arc;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::models::amount::parse_raw_balance;
use crate::models::{
    is_native_or_zero, is_zero_address, normalize_address, Network, Networks, TokenRecord,
    TokenSlug,
};
use crate::sources::{ChainBalanceSource, IndexerSource, IndexerToken, PriceMap, PriceOracle};
use crate::staleness::{check_chain_sync_freshness, log_chain_sync_freshness};
use crate::storage::{TokenRepository, TokenScope, TokenSyncBatch};

use super::merge::{apply_quote, merge_indexer_row, skip_indexer_row, PriceOutcome};

/// What one reconciliation did, pass by pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub chain_id: u64,
    pub account: String,

    pub indexer_rows: usize,
    pub indexer_failed: bool,
    pub indexer_upserts: usize,
    pub skipped_native: usize,
    pub skipped_fresh: usize,
    pub skipped_policy: usize,

    pub chain_candidates: usize,
    pub chain_fallback_skipped: bool,
    pub chain_synced: usize,
    pub chain_failed: usize,

    pub price_failed: bool,
    pub priced: usize,
    pub unpriced: usize,

    /// Records written to the repository.
    pub committed: usize,
}

impl ReconcileReport {
    fn new(chain_id: u64, account: &Address) -> Self {
        Self {
            chain_id,
            account: account.to_checksum(None),
            ..Self::default()
        }
    }
}

/// Merges indexer, chain and price data into the persisted token set.
///
/// Only repository failures and unknown chains are errors. Source outages
/// degrade the result and are recorded in the [`ReconcileReport`].
pub struct AssetReconciler {
    networks: Networks,
    indexer: Arc<dyn IndexerSource>,
    chain: Arc<dyn ChainBalanceSource>,
    prices: Arc<dyn PriceOracle>,
    repository: Arc<dyn TokenRepository>,
    settings: SyncConfig,
    clock: Arc<dyn Clock>,
}

impl AssetReconciler {
    pub fn new(
        networks: Networks,
        indexer: Arc<dyn IndexerSource>,
        chain: Arc<dyn ChainBalanceSource>,
        prices: Arc<dyn PriceOracle>,
        repository: Arc<dyn TokenRepository>,
    ) -> Self {
        Self {
            networks,
            indexer,
            chain,
            prices,
            repository,
            settings: SyncConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_settings(mut self, settings: SyncConfig) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn networks(&self) -> &Networks {
        &self.networks
    }

    pub fn repository(&self) -> &Arc<dyn TokenRepository> {
        &self.repository
    }

    pub fn settings(&self) -> &SyncConfig {
        &self.settings
    }

    /// Run the indexer, chain and price passes for one account, then commit
    /// whatever changed.
    pub async fn reconcile(
        &self,
        chain_id: u64,
        account: Address,
    ) -> Result<ReconcileReport, SyncError> {
        let network = self.networks.get(chain_id)?.clone();
        let scope = TokenScope::assets(chain_id, account);
        let mut report = ReconcileReport::new(chain_id, &account);

        let (rows, batch) = tokio::join!(
            self.indexer.fetch_account_tokens(chain_id, account),
            TokenSyncBatch::prepare(self.repository.as_ref(), scope),
        );
        let mut batch = batch.map_err(SyncError::repository)?;
        let rows = rows.unwrap_or_else(|err| {
            warn!(
                chain_id,
                account = %report.account,
                source = self.indexer.name(),
                error = %format!("{err:#}"),
                "indexer fetch failed; continuing with stored tokens"
            );
            report.indexer_failed = true;
            Vec::new()
        });

        let now = self.clock.now();
        self.merge_indexer_rows(&network, &rows, &mut batch, now, &mut report);
        self.chain_fallback(chain_id, account, &mut batch, &mut report)
            .await;
        self.enrich_prices(chain_id, &mut batch, &mut report).await;

        report.committed = batch
            .commit(self.repository.as_ref())
            .await
            .map_err(SyncError::repository)?;

        info!(
            chain_id,
            account = %report.account,
            indexer_upserts = report.indexer_upserts,
            chain_synced = report.chain_synced,
            priced = report.priced,
            committed = report.committed,
            "reconciled account assets"
        );
        Ok(report)
    }

    fn merge_indexer_rows(
        &self,
        network: &Network,
        rows: &[IndexerToken],
        batch: &mut TokenSyncBatch,
        now: DateTime<Utc>,
        report: &mut ReconcileReport,
    ) {
        report.indexer_rows = rows.len();
        let scope = *batch.scope();

        for row in rows {
            let address = match normalize_address(&row.contract_address) {
                Ok(address) => address,
                Err(err) => {
                    debug!(error = %err, "skipping indexer row with bad contract address");
                    report.skipped_policy += 1;
                    continue;
                }
            };
            if is_native_or_zero(row.native_token, &address) {
                report.skipped_native += 1;
                continue;
            }

            let slug = TokenSlug::erc20(address);
            let existing = batch.existing(&slug).cloned();

            if let Some(existing) = &existing {
                let check =
                    check_chain_sync_freshness(existing, self.settings.chain_sync_freshness, now);
                log_chain_sync_freshness(&slug.to_string(), &check);
                if !check.is_stale {
                    report.skipped_fresh += 1;
                    continue;
                }
            }

            let Some(raw_balance) = parse_raw_balance(&row.balance) else {
                debug!(token = %slug, balance = %row.balance, "skipping unparsable balance");
                report.skipped_policy += 1;
                continue;
            };
            if skip_indexer_row(row, &address, existing.is_some(), raw_balance, network) {
                report.skipped_policy += 1;
                continue;
            }

            let record = merge_indexer_row(row, raw_balance, existing.as_ref(), network, || {
                TokenRecord::new_asset(scope.chain_id, scope.account, slug.clone())
            });
            batch.stage(record);
            report.indexer_upserts += 1;
        }
    }

    /// Read balances straight from the chain for tokens we already know.
    ///
    /// Skipped for empty accounts and for accounts at or above the fan-out
    /// limit. Individual read failures leave the staged record alone.
    async fn chain_fallback(
        &self,
        chain_id: u64,
        account: Address,
        batch: &mut TokenSyncBatch,
        report: &mut ReconcileReport,
    ) {
        let candidates: Vec<TokenSlug> = batch
            .existing_records()
            .iter()
            .filter(|record| !is_zero_address(&record.token_address()))
            .map(|record| record.token_slug.clone())
            .collect();
        report.chain_candidates = candidates.len();

        if candidates.is_empty() {
            return;
        }
        if candidates.len() >= self.settings.chain_fallback_limit {
            info!(
                chain_id,
                tokens = candidates.len(),
                limit = self.settings.chain_fallback_limit,
                "too many tokens for chain fallback; skipping"
            );
            report.chain_fallback_skipped = true;
            return;
        }

        let results = join_all(
            candidates
                .iter()
                .map(|slug| self.chain.fetch_balance(chain_id, slug, account)),
        )
        .await;
        let synced_at = self.clock.now();

        for (slug, result) in candidates.iter().zip(results) {
            match result {
                Ok(Some(balance)) => {
                    let Some(mut record) = batch.staged(slug).cloned() else {
                        continue;
                    };
                    record.raw_balance = balance;
                    record.synced_by_chain_at = Some(synced_at);
                    batch.stage(record);
                    report.chain_synced += 1;
                }
                Ok(None) => {}
                Err(err) => {
                    debug!(
                        token = %slug,
                        source = self.chain.name(),
                        error = %format!("{err:#}"),
                        "chain balance read failed"
                    );
                    report.chain_failed += 1;
                }
            }
        }
    }

    async fn enrich_prices(
        &self,
        chain_id: u64,
        batch: &mut TokenSyncBatch,
        report: &mut ReconcileReport,
    ) {
        let addresses: Vec<Address> = batch
            .staged_records()
            .iter()
            .map(TokenRecord::token_address)
            .collect();
        if addresses.is_empty() {
            return;
        }

        let quotes = match self.prices.fetch_prices(&addresses, chain_id).await {
            Ok(quotes) => quotes,
            Err(err) => {
                warn!(
                    chain_id,
                    source = self.prices.name(),
                    error = %format!("{err:#}"),
                    "price fetch failed; keeping previous prices"
                );
                report.price_failed = true;
                PriceMap::new()
            }
        };
        // An empty map is indistinguishable from an outage.
        if quotes.is_empty() {
            debug!(chain_id, "no price quotes; leaving prices untouched");
            return;
        }

        for record in batch.staged_records_mut() {
            match apply_quote(record, quotes.get(&record.token_address())) {
                PriceOutcome::Priced => report.priced += 1,
                PriceOutcome::Unpriced => report.unpriced += 1,
                PriceOutcome::Skipped => {}
            }
        }
    }
}
