//! `SkipDecisionStore` — durable, multi-session record that a client
//! should bypass server-rendered hydration.
//!
//! The skip window is bounded and self-healing: once `expires_at` passes,
//! hydration is re-attempted and the record is only re-set if it fails
//! again. `failure_streak` is diagnostic-only and survives expiry; only
//! `clear()` resets it.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::constants::SKIP_DECISION_KEY;
use crate::errors::StorageError;
use crate::traits::{Clock, IKeyValueStore};
use crate::types::SkipDecisionRecord;

pub struct SkipDecisionStore {
    durable: Arc<dyn IKeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl_ms: u64,
}

impl SkipDecisionStore {
    pub fn new(durable: Arc<dyn IKeyValueStore>, clock: Arc<dyn Clock>, ttl_ms: u64) -> Self {
        Self {
            durable,
            clock,
            ttl_ms,
        }
    }

    /// Whether the next page load should bypass hydration. Absent, expired,
    /// or unreadable records all mean "attempt hydration".
    pub fn should_skip(&self) -> bool {
        match self.read() {
            Some(record) => record.should_skip && !record.is_expired(self.clock.now_millis()),
            None => false,
        }
    }

    /// Write (or refresh) the skip record with a fresh expiry and an
    /// incremented failure streak.
    pub fn record_failure(&self, reason: &str) -> Result<SkipDecisionRecord, StorageError> {
        let now = self.clock.now_millis();
        let streak = self.read().map(|r| r.failure_streak).unwrap_or(0);
        let record = SkipDecisionRecord {
            should_skip: true,
            reason: reason.to_string(),
            set_at: now,
            expires_at: now.saturating_add(self.ttl_ms),
            failure_streak: streak + 1,
        };
        let json = serde_json::to_string(&record)?;
        self.durable.set(SKIP_DECISION_KEY, &json, None)?;
        debug!(
            reason = reason,
            failure_streak = record.failure_streak,
            expires_at = record.expires_at,
            "skip decision recorded"
        );
        Ok(record)
    }

    /// Remove the record (user manually retried successfully).
    pub fn clear(&self) -> Result<(), StorageError> {
        self.durable.remove(SKIP_DECISION_KEY)
    }

    /// Current record regardless of expiry, for diagnostics.
    pub fn current(&self) -> Option<SkipDecisionRecord> {
        self.read()
    }

    fn read(&self) -> Option<SkipDecisionRecord> {
        let json = match self.durable.get(SKIP_DECISION_KEY) {
            Ok(v) => v?,
            Err(e) => {
                warn!(error = %e, "skip decision unreadable — treating as absent");
                return None;
            }
        };
        match serde_json::from_str(&json) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "skip decision corrupt — treating as absent");
                None
            }
        }
    }
}
