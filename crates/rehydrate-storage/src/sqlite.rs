//! `SqliteStore` — concrete `IKeyValueStore` backed by SQLite.
//!
//! Single table, single connection behind a mutex. Recovery-engine storage
//! traffic is a handful of reads at mount and a handful of writes at
//! fallback, so connection pooling would be dead weight. Expired entries
//! are deleted lazily on read; `purge_expired()` exists for hosts that
//! want periodic maintenance.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use rehydrate_core::errors::StorageError;
use rehydrate_core::traits::{Clock, IKeyValueStore, WallClock};

pub struct SqliteStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    /// Open (or create) a file-backed store at the given path.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Self::open_with_clock(path, Arc::new(WallClock))
    }

    pub fn open_with_clock(path: &Path, clock: Arc<dyn Clock>) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(sqe)?;
        Self::from_connection(conn, clock)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::open_in_memory_with_clock(Arc::new(WallClock))
    }

    pub fn open_in_memory_with_clock(clock: Arc<dyn Clock>) -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(sqe)?;
        Self::from_connection(conn, clock)
    }

    fn from_connection(conn: Connection, clock: Arc<dyn Clock>) -> Result<Self, StorageError> {
        conn.pragma_update(None, "journal_mode", "WAL").map_err(sqe)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                expires_at INTEGER
            )",
            [],
        )
        .map_err(sqe)?;
        Ok(Self {
            conn: Mutex::new(conn),
            clock,
        })
    }

    /// Delete every expired entry. Returns the number of rows removed.
    pub fn purge_expired(&self) -> Result<usize, StorageError> {
        let now = self.clock.now_millis();
        let conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        let purged = conn
            .execute(
                "DELETE FROM kv WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                [now as i64],
            )
            .map_err(sqe)?;
        if purged > 0 {
            debug!(purged, "purged expired kv entries");
        }
        Ok(purged)
    }
}

impl IKeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let now = self.clock.now_millis();
        let conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        let row: Option<(String, Option<i64>)> = conn
            .query_row(
                "SELECT value, expires_at FROM kv WHERE key = ?1",
                [key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(sqe)?;
        match row {
            Some((_, Some(expires_at))) if now as i64 >= expires_at => {
                conn.execute("DELETE FROM kv WHERE key = ?1", [key])
                    .map_err(sqe)?;
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str, ttl_ms: Option<u64>) -> Result<(), StorageError> {
        let expires_at = ttl_ms.map(|ttl| self.clock.now_millis().saturating_add(ttl) as i64);
        let conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        conn.execute(
            "INSERT INTO kv (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, expires_at = ?3",
            rusqlite::params![key, value, expires_at],
        )
        .map_err(sqe)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        conn.execute("DELETE FROM kv WHERE key = ?1", [key])
            .map_err(sqe)?;
        Ok(())
    }
}

fn sqe(e: impl std::fmt::Display) -> StorageError {
    StorageError::SqliteError {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rehydrate_core::traits::ManualClock;

    #[test]
    fn round_trip_in_memory() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v", None).unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        store.set("k", "v2", None).unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v2".to_string()));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn ttl_expiry_is_lazy_but_honored() {
        let clock = Arc::new(ManualClock::new(1_000));
        let store = SqliteStore::open_in_memory_with_clock(clock.clone()).unwrap();
        store.set("k", "v", Some(500)).unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        clock.advance(500);
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn purge_removes_only_expired_rows() {
        let clock = Arc::new(ManualClock::new(1_000));
        let store = SqliteStore::open_in_memory_with_clock(clock.clone()).unwrap();
        store.set("stale", "v", Some(100)).unwrap();
        store.set("fresh", "v", Some(10_000)).unwrap();
        store.set("forever", "v", None).unwrap();
        clock.advance(200);
        assert_eq!(store.purge_expired().unwrap(), 1);
        assert_eq!(store.get("fresh").unwrap(), Some("v".to_string()));
        assert_eq!(store.get("forever").unwrap(), Some("v".to_string()));
    }
}
