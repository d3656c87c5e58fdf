//! Time-boxed, single-flight memoization.
//!
//! A [`TtlMemo`] maps a composite key to the shared future of the first call
//! made with that key. Every caller inside the TTL window awaits that same
//! future, whether it is still running or already finished. Failed results
//! are handed to everyone already waiting on them and then evicted, so a
//! failure is never served as a cached success.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;

use crate::clock::{Clock, SystemClock};

type SharedResult<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

struct Entry<V, E> {
    generation: u64,
    expires_at: DateTime<Utc>,
    result: SharedResult<V, E>,
}

struct MemoState<V, E> {
    entries: HashMap<String, Entry<V, E>>,
    next_generation: u64,
}

pub struct TtlMemo<V, E> {
    name: &'static str,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<MemoState<V, E>>>,
}

/// Join call arguments into a single cache key.
pub fn cache_key<I, T>(parts: I) -> String
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    parts
        .into_iter()
        .map(|part| part.to_string())
        .collect::<Vec<_>>()
        .join("_")
}

impl<V, E> TtlMemo<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            clock: Arc::new(SystemClock),
            state: Arc::new(Mutex::new(MemoState {
                entries: HashMap::new(),
                next_generation: 0,
            })),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the memoized result for `key`, running `run` only when no live
    /// entry exists.
    pub async fn get_or_run<F, Fut>(&self, key: &str, run: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let shared = {
            let mut state = self.state.lock().expect("memo lock poisoned");
            let now = self.clock.now();
            Self::evict_expired(&mut state, now);

            match state.entries.get(key) {
                Some(entry) => {
                    debug!(memo = self.name, key, "joining memoized call");
                    entry.result.clone()
                }
                None => {
                    let generation = state.next_generation;
                    state.next_generation += 1;

                    let result =
                        Self::evict_on_error(Arc::downgrade(&self.state), key, generation, run())
                            .boxed()
                            .shared();
                    state.entries.insert(
                        key.to_string(),
                        Entry {
                            generation,
                            expires_at: now + self.chrono_ttl(),
                            result: result.clone(),
                        },
                    );
                    result
                }
            }
        };

        shared.await
    }

    /// Drop every entry, in flight or not.
    pub fn clear(&self) {
        let mut state = self.state.lock().expect("memo lock poisoned");
        state.entries.clear();
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let mut state = self.state.lock().expect("memo lock poisoned");
        Self::evict_expired(&mut state, self.clock.now());
        state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn chrono_ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::days(36500))
    }

    fn evict_expired(state: &mut MemoState<V, E>, now: DateTime<Utc>) {
        state.entries.retain(|_, entry| entry.expires_at > now);
    }

    fn evict_on_error<Fut>(
        state: Weak<Mutex<MemoState<V, E>>>,
        key: &str,
        generation: u64,
        fut: Fut,
    ) -> impl Future<Output = Result<V, E>> + Send + 'static
    where
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let key = key.to_string();
        async move {
            let result = fut.await;
            if result.is_err() {
                if let Some(state) = state.upgrade() {
                    let mut state = state.lock().expect("memo lock poisoned");
                    // Only remove our own entry; a newer call may have replaced it.
                    if state.entries.get(&key).map(|e| e.generation) == Some(generation) {
                        state.entries.remove(&key);
                    }
                }
            }
            result
        }
    }
}
