//! `StateSnapshotter` — carries declared durable keys across a forced
//! reload via the ephemeral store, with at-most-once restoration.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::constants::SNAPSHOT_KEY;
use crate::errors::StorageError;
use crate::traits::{Clock, IKeyValueStore};
use crate::types::StateSnapshot;

pub struct StateSnapshotter {
    durable: Arc<dyn IKeyValueStore>,
    ephemeral: Arc<dyn IKeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl StateSnapshotter {
    pub fn new(
        durable: Arc<dyn IKeyValueStore>,
        ephemeral: Arc<dyn IKeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            durable,
            ephemeral,
            clock,
        }
    }

    /// Read each declared key from the durable store and write one snapshot
    /// into the ephemeral store, scoped to the upcoming reload.
    ///
    /// The write completes before this returns — the caller may only
    /// trigger the reload after observing `Ok`. Missing keys are skipped;
    /// an empty capture writes nothing. Returns the number of entries
    /// captured.
    pub fn capture(&self, keys: &[String]) -> Result<usize, StorageError> {
        let mut entries = BTreeMap::new();
        for key in keys {
            if let Some(value) = self.durable.get(key)? {
                entries.insert(key.clone(), value);
            }
        }
        if entries.is_empty() {
            debug!("no declared state present — skipping snapshot");
            return Ok(0);
        }

        let snapshot = StateSnapshot {
            captured_at: self.clock.now_millis(),
            entries,
            consumed: false,
        };
        let json = serde_json::to_string(&snapshot)?;
        self.ephemeral.set(SNAPSHOT_KEY, &json, None)?;
        debug!(entries = snapshot.entries.len(), "state snapshot captured");
        Ok(snapshot.entries.len())
    }

    /// Restore a pending snapshot into the durable store, if one exists.
    ///
    /// At-most-once: the snapshot is claimed (deleted) before its entries
    /// are written back, so a second call — even from another mounted
    /// consumer — restores nothing. Returns the number of entries restored.
    pub fn restore_if_present(&self) -> Result<usize, StorageError> {
        let Some(json) = self.ephemeral.get(SNAPSHOT_KEY)? else {
            return Ok(0);
        };

        // Claim before applying: stale reapplication on a later, unrelated
        // reload is worse than a lost entry on a mid-restore crash.
        self.ephemeral.remove(SNAPSHOT_KEY)?;

        let snapshot: StateSnapshot = match serde_json::from_str(&json) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "discarding unparseable state snapshot");
                return Ok(0);
            }
        };
        if snapshot.consumed {
            return Ok(0);
        }

        let mut restored = 0;
        for (key, value) in &snapshot.entries {
            self.durable.set(key, value, None)?;
            restored += 1;
        }
        debug!(entries = restored, "state snapshot restored");
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ManualClock, MemoryStore};

    fn setup() -> (Arc<MemoryStore>, Arc<MemoryStore>, StateSnapshotter) {
        let clock: Arc<ManualClock> = Arc::new(ManualClock::new(1_000));
        let durable = Arc::new(MemoryStore::with_clock(clock.clone()));
        let ephemeral = Arc::new(MemoryStore::with_clock(clock.clone()));
        let snapshotter =
            StateSnapshotter::new(durable.clone(), ephemeral.clone(), clock);
        (durable, ephemeral, snapshotter)
    }

    #[test]
    fn capture_then_restore_round_trip() {
        let (durable, _ephemeral, snapshotter) = setup();
        durable.set("pref.theme", "dark", None).unwrap();
        durable.set("pref.locale", "de", None).unwrap();

        let captured = snapshotter
            .capture(&["pref.theme".into(), "pref.locale".into(), "absent".into()])
            .unwrap();
        assert_eq!(captured, 2);

        // Simulate the reload wiping durable working copies.
        durable.remove("pref.theme").unwrap();
        durable.remove("pref.locale").unwrap();

        let restored = snapshotter.restore_if_present().unwrap();
        assert_eq!(restored, 2);
        assert_eq!(durable.get("pref.theme").unwrap(), Some("dark".into()));
        assert_eq!(durable.get("pref.locale").unwrap(), Some("de".into()));
    }

    #[test]
    fn restore_is_at_most_once() {
        let (durable, _ephemeral, snapshotter) = setup();
        durable.set("pref.theme", "dark", None).unwrap();
        snapshotter.capture(&["pref.theme".into()]).unwrap();

        assert_eq!(snapshotter.restore_if_present().unwrap(), 1);
        durable.set("pref.theme", "light", None).unwrap();
        // Second call must not reapply the stale value.
        assert_eq!(snapshotter.restore_if_present().unwrap(), 0);
        assert_eq!(durable.get("pref.theme").unwrap(), Some("light".into()));
    }

    #[test]
    fn empty_capture_writes_nothing() {
        let (_durable, ephemeral, snapshotter) = setup();
        assert_eq!(snapshotter.capture(&["absent".into()]).unwrap(), 0);
        assert_eq!(ephemeral.get(SNAPSHOT_KEY).unwrap(), None);
    }

    #[test]
    fn corrupt_snapshot_is_discarded() {
        let (_durable, ephemeral, snapshotter) = setup();
        ephemeral.set(SNAPSHOT_KEY, "not json", None).unwrap();
        assert_eq!(snapshotter.restore_if_present().unwrap(), 0);
        assert_eq!(ephemeral.get(SNAPSHOT_KEY).unwrap(), None);
    }
}
