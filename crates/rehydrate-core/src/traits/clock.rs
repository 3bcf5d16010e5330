//! Clock seam. Every timestamp and timeout in the engine flows through
//! `Clock`, so tests drive time with [`ManualClock`] instead of sleeping.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::EpochMillis;

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> EpochMillis;
}

/// System wall clock.
#[derive(Debug, Default)]
pub struct WallClock;

impl Clock for WallClock {
    fn now_millis(&self) -> EpochMillis {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as EpochMillis
    }
}

/// Manually advanced clock for deterministic tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<EpochMillis>,
}

impl ManualClock {
    pub fn new(start: EpochMillis) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: EpochMillis) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, delta_ms: u64) {
        *self.now.lock().unwrap() += delta_ms;
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> EpochMillis {
        *self.now.lock().unwrap()
    }
}
