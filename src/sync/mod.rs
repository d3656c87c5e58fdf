//! Asset reconciliation for a single account on a single chain.
//!
//! The [`AssetReconciler`] runs the indexer, chain and price passes against
//! a staged copy of the stored token set. The [`AssetSyncService`] wraps it
//! with memoization so rapid or concurrent UI triggers collapse into one run.

mod indexer_cache;
pub mod merge;
mod reconcile;
mod service;

pub use indexer_cache::MemoizedIndexer;
pub use reconcile::{AssetReconciler, ReconcileReport};
pub use service::{AssetSyncService, SyncContext};
