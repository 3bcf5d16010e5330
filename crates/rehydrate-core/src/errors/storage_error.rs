//! Storage-layer errors for the key-value backends.

/// Errors that can occur in a key-value store backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Operation not supported: {operation} — {reason}")]
    NotSupported { operation: String, reason: String },
}
