#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{Address, U256};
use anyhow::Result;
use async_trait::async_trait;
use assetsync::clock::Clock;
use assetsync::config::SyncConfig;
use assetsync::models::{normalize_address, Networks, TokenRecord, TokenSlug};
use assetsync::sources::{
    ChainBalanceSource, IndexerSource, IndexerToken, PriceMap, PriceOracle, TokenPrice,
};
use assetsync::storage::{MemoryTokenRepository, TokenScope};
use assetsync::sync::{AssetReconciler, AssetSyncService, SyncContext};

pub const ACCOUNT: &str = "0x1111111111111111111111111111111111111111";
pub const MAINNET: u64 = 1;
pub const TESTNET: u64 = 11155111;

pub fn account() -> Address {
    normalize_address(ACCOUNT).unwrap()
}

/// Deterministic, non-sentinel token address for index `n`.
pub fn token(n: u32) -> Address {
    normalize_address(&token_hex(n)).unwrap()
}

pub fn token_hex(n: u32) -> String {
    format!("0x{:0>40x}", 0x1000_0000u64 + u64::from(n))
}

pub fn record(chain_id: u64, token_address: Address, raw_balance: u64) -> TokenRecord {
    let mut record = TokenRecord::new_asset(chain_id, account(), TokenSlug::erc20(token_address));
    record.symbol = "TKN".to_string();
    record.name = "Token".to_string();
    record.decimals = 18;
    record.raw_balance = U256::from(raw_balance);
    record
}

#[derive(Default)]
pub struct MockIndexer {
    rows: Mutex<Vec<IndexerToken>>,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
    pub calls: AtomicUsize,
}

impl MockIndexer {
    pub fn with_rows(rows: Vec<IndexerToken>) -> Arc<Self> {
        let indexer = Self::default();
        *indexer.rows.lock().unwrap() = rows;
        Arc::new(indexer)
    }

    pub fn set_rows(&self, rows: Vec<IndexerToken>) {
        *self.rows.lock().unwrap() = rows;
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndexerSource for MockIndexer {
    async fn fetch_account_tokens(
        &self,
        _chain_id: u64,
        _account: Address,
    ) -> Result<Vec<IndexerToken>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("indexer unavailable");
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    fn name(&self) -> &str {
        "mock-indexer"
    }
}

#[derive(Default)]
pub struct MockChain {
    balances: Mutex<HashMap<Address, U256>>,
    failing: Mutex<HashSet<Address>>,
    pub calls: AtomicUsize,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_balance(&self, token: Address, balance: u64) {
        self.balances
            .lock()
            .unwrap()
            .insert(token, U256::from(balance));
    }

    pub fn set_failing(&self, token: Address) {
        self.failing.lock().unwrap().insert(token);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainBalanceSource for MockChain {
    async fn fetch_balance(
        &self,
        _chain_id: u64,
        token: &TokenSlug,
        _account: Address,
    ) -> Result<Option<U256>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&token.address()) {
            anyhow::bail!("execution reverted");
        }
        Ok(self.balances.lock().unwrap().get(&token.address()).copied())
    }

    fn name(&self) -> &str {
        "mock-chain"
    }
}

#[derive(Default)]
pub struct MockPrices {
    quotes: Mutex<PriceMap>,
    fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl MockPrices {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_quote(&self, token: Address, price: TokenPrice) {
        self.quotes.lock().unwrap().insert(token, price);
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceOracle for MockPrices {
    async fn fetch_prices(&self, addresses: &[Address], _chain_id: u64) -> Result<PriceMap> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("price oracle unavailable");
        }
        let quotes = self.quotes.lock().unwrap();
        Ok(addresses
            .iter()
            .filter_map(|a| quotes.get(a).map(|q| (*a, q.clone())))
            .collect())
    }

    fn name(&self) -> &str {
        "mock-prices"
    }
}

/// Mocks plus an in-memory repository wired together.
pub struct Harness {
    pub indexer: Arc<MockIndexer>,
    pub chain: Arc<MockChain>,
    pub prices: Arc<MockPrices>,
    pub repository: Arc<MemoryTokenRepository>,
    pub clock: Arc<dyn Clock>,
}

impl Harness {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            indexer: MockIndexer::with_rows(Vec::new()),
            chain: MockChain::new(),
            prices: MockPrices::new(),
            repository: Arc::new(MemoryTokenRepository::new()),
            clock,
        }
    }

    pub async fn seed(&self, chain_id: u64, records: Vec<TokenRecord>) {
        self.repository
            .insert(TokenScope::assets(chain_id, account()), records)
            .await;
    }

    pub async fn stored(&self, chain_id: u64) -> Vec<TokenRecord> {
        use assetsync::storage::TokenRepository;
        self.repository
            .load_tokens(&TokenScope::assets(chain_id, account()))
            .await
            .unwrap()
    }

    pub async fn stored_token(&self, chain_id: u64, token: Address) -> Option<TokenRecord> {
        self.stored(chain_id)
            .await
            .into_iter()
            .find(|r| r.token_address() == token)
    }

    pub fn reconciler(&self) -> AssetReconciler {
        AssetReconciler::new(
            Networks::builtin(),
            self.indexer.clone(),
            self.chain.clone(),
            self.prices.clone(),
            self.repository.clone(),
        )
        .with_clock(self.clock.clone())
    }

    pub fn service(&self) -> AssetSyncService {
        self.service_with(SyncConfig::default())
    }

    pub fn service_with(&self, settings: SyncConfig) -> AssetSyncService {
        AssetSyncService::new(
            SyncContext::new(
                Networks::builtin(),
                self.indexer.clone(),
                self.chain.clone(),
                self.prices.clone(),
                self.repository.clone(),
            )
            .with_settings(settings)
            .with_clock(self.clock.clone()),
        )
    }
}
