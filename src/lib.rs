pub mod clock;
pub mod config;
pub mod duration;
pub mod error;
pub mod memo;
pub mod models;
pub mod sources;
pub mod staleness;
pub mod storage;
pub mod sync;

pub use error::SyncError;
