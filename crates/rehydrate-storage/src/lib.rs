//! # rehydrate-storage
//!
//! SQLite persistence for the Rehydrate recovery engine: the durable
//! key-value backend behind the skip-decision store and preserved user
//! state. WAL mode, TTL-aware reads, lazy plus explicit expiry purging.

pub mod sqlite;

pub use sqlite::SqliteStore;
