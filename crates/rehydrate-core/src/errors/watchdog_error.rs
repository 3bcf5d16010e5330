//! Orchestrator-level errors.
//!
//! Per the propagation policy, errors reported *to* the watchdog are never
//! rethrown — they are folded into the error log. `WatchdogError` covers the
//! engine's own failures: bad configuration and storage faults surfaced by
//! explicit maintenance operations.

use thiserror::Error;

use super::storage_error::StorageError;

#[derive(Debug, Error)]
pub enum WatchdogError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Snapshot capture failed: {reason}")]
    SnapshotFailed { reason: String },
}

pub type WatchdogResult<T> = Result<T, WatchdogError>;
