use std::sync::Arc;

use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::memo::{cache_key, TtlMemo};
use crate::models::{normalize_address, Networks, TokenRecord};
use crate::sources::{ChainBalanceSource, IndexerSource, PriceOracle};
use crate::storage::{TokenRepository, TokenScope};

use super::{AssetReconciler, MemoizedIndexer, ReconcileReport};

/// Everything an [`AssetSyncService`] is built from.
pub struct SyncContext {
    pub networks: Networks,
    pub indexer: Arc<dyn IndexerSource>,
    pub chain: Arc<dyn ChainBalanceSource>,
    pub prices: Arc<dyn PriceOracle>,
    pub repository: Arc<dyn TokenRepository>,
    pub settings: SyncConfig,
    pub clock: Arc<dyn Clock>,
}

impl SyncContext {
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
}

/// Entry point for UI-triggered asset syncs.
///
/// Repeated or concurrent requests for the same chain and account within the
/// reconcile window share one reconciliation. Indexer responses are memoized
/// separately with a shorter window.
pub struct AssetSyncService {
    reconciler: Arc<AssetReconciler>,
    indexer_cache: Arc<MemoizedIndexer>,
    reconcile_memo: TtlMemo<ReconcileReport, SyncError>,
}

impl AssetSyncService {
    pub fn new(context: SyncContext) -> Self {
        let SyncContext {
            networks,
            indexer,
            chain,
            prices,
            repository,
            settings,
            clock,
        } = context;

        let indexer_cache = Arc::new(
            MemoizedIndexer::new(indexer, settings.indexer_ttl).with_clock(Arc::clone(&clock)),
        );
        let reconcile_memo =
            TtlMemo::new("reconcile", settings.reconcile_ttl).with_clock(Arc::clone(&clock));
        let reconciler = AssetReconciler::new(
            networks,
            indexer_cache.clone(),
            chain,
            prices,
            repository,
        )
        .with_settings(settings)
        .with_clock(clock);

        Self {
            reconciler: Arc::new(reconciler),
            indexer_cache,
            reconcile_memo,
        }
    }

    pub fn reconciler(&self) -> &AssetReconciler {
        &self.reconciler
    }

    /// Reconcile the stored assets of `account` on `chain_id`.
    ///
    /// Fails fast, before any fetch, for an unknown chain or a malformed
    /// address.
    pub async fn sync_account_assets(
        &self,
        chain_id: u64,
        account: &str,
    ) -> Result<ReconcileReport, SyncError> {
        let account = normalize_address(account)?;
        self.reconciler.networks().get(chain_id)?;

        let key = cache_key([chain_id.to_string(), account.to_checksum(None)]);
        let reconciler = Arc::clone(&self.reconciler);
        self.reconcile_memo
            .get_or_run(&key, move || async move {
                reconciler.reconcile(chain_id, account).await
            })
            .await
    }

    /// Stored asset records for an account, without syncing.
    pub async fn account_tokens(
        &self,
        chain_id: u64,
        account: &str,
    ) -> Result<Vec<TokenRecord>, SyncError> {
        let account = normalize_address(account)?;
        self.reconciler.networks().get(chain_id)?;
        self.reconciler
            .repository()
            .load_tokens(&TokenScope::assets(chain_id, account))
            .await
            .map_err(SyncError::repository)
    }

    /// Forget memoized reconciliations and indexer responses.
    pub fn clear_caches(&self) {
        debug!("clearing asset sync caches");
        self.reconcile_memo.clear();
        self.indexer_cache.clear();
    }
}
