//! Error types shared across Rehydrate crates.

pub mod storage_error;
pub mod watchdog_error;

pub use storage_error::StorageError;
pub use watchdog_error::{WatchdogError, WatchdogResult};
