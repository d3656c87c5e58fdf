use thiserror::Error;

/// Failures that reach the caller of a reconciliation.
///
/// Everything else (indexer outages, price outages, per-token chain read
/// failures) is absorbed by the pipeline and only logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Unsupported chain: {chain_id}")]
    UnsupportedChain { chain_id: u64 },

    #[error("Invalid account address: {address}")]
    InvalidAddress { address: String },

    #[error("Token repository error: {0}")]
    Repository(String),
}

impl SyncError {
    pub(crate) fn repository(err: anyhow::Error) -> Self {
        SyncError::Repository(format!("{err:#}"))
    }
}
