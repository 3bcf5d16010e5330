//! `IKeyValueStore` — the storage primitive the engine consumes, plus the
//! in-memory implementation used as the ephemeral backend and as the test
//! double for the durable one.
//!
//! Concrete durable backends live in `rehydrate-storage`.

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use crate::errors::StorageError;
use crate::traits::clock::{Clock, WallClock};
use crate::types::EpochMillis;

/// Minimal key-value contract: `get` / `set` / `remove`, string values,
/// optional TTL. Entries past their TTL read back as `None`.
pub trait IKeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str, ttl_ms: Option<u64>) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

struct Entry {
    value: String,
    expires_at: Option<EpochMillis>,
}

/// In-memory key-value store with TTL support.
///
/// Serves as the ephemeral backend (survives nothing — exactly the
/// lifetime of the owning process) and as the hermetic stand-in for the
/// durable store in tests.
pub struct MemoryStore {
    entries: Mutex<FxHashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(WallClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IKeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let now = self.clock.now_millis();
        let mut entries = self.entries.lock().map_err(|_| StorageError::LockPoisoned)?;
        let expired = matches!(
            entries.get(key),
            Some(Entry { expires_at: Some(at), .. }) if now >= *at
        );
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|e| e.value.clone()))
    }

    fn set(&self, key: &str, value: &str, ttl_ms: Option<u64>) -> Result<(), StorageError> {
        let expires_at = ttl_ms.map(|ttl| self.clock.now_millis().saturating_add(ttl));
        let mut entries = self.entries.lock().map_err(|_| StorageError::LockPoisoned)?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::clock::ManualClock;

    #[test]
    fn set_get_remove_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v", None).unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn ttl_expiry_honored() {
        let clock = Arc::new(ManualClock::new(1_000));
        let store = MemoryStore::with_clock(clock.clone());
        store.set("k", "v", Some(500)).unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        clock.advance(499);
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        clock.advance(1);
        assert_eq!(store.get("k").unwrap(), None);
        // Expired entry is physically gone.
        assert!(store.is_empty());
    }

    #[test]
    fn overwrite_replaces_value_and_ttl() {
        let clock = Arc::new(ManualClock::new(0));
        let store = MemoryStore::with_clock(clock.clone());
        store.set("k", "old", Some(100)).unwrap();
        store.set("k", "new", None).unwrap();
        clock.advance(10_000);
        assert_eq!(store.get("k").unwrap(), Some("new".to_string()));
    }
}
