//! In-memory token repository for tests and ephemeral runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use tokio::sync::Mutex;

use crate::models::TokenRecord;

use super::{upsert_by_slug, TokenRepository, TokenScope};

#[derive(Default)]
pub struct MemoryTokenRepository {
    tokens: Mutex<HashMap<TokenScope, Vec<TokenRecord>>>,
    commits: AtomicUsize,
}

impl MemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed records without counting as a commit.
    pub async fn insert(&self, scope: TokenScope, records: Vec<TokenRecord>) {
        let mut tokens = self.tokens.lock().await;
        upsert_by_slug(tokens.entry(scope).or_default(), &records);
    }

    /// Number of successful `commit_tokens` calls.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TokenRepository for MemoryTokenRepository {
    async fn load_tokens(&self, scope: &TokenScope) -> Result<Vec<TokenRecord>> {
        let tokens = self.tokens.lock().await;
        Ok(tokens.get(scope).cloned().unwrap_or_default())
    }

    async fn commit_tokens(&self, scope: &TokenScope, records: &[TokenRecord]) -> Result<()> {
        let mut tokens = self.tokens.lock().await;
        upsert_by_slug(tokens.entry(*scope).or_default(), records);
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
