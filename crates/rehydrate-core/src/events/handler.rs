//! Handler trait for watchdog events. All methods default to no-ops so a
//! consumer only implements what it displays.

use crate::types::{EpochMillis, ErrorRecord, Phase};

pub trait WatchdogEventHandler: Send {
    /// A phase transition occurred. Delivered synchronously, in the order
    /// transitions happen — the last delivery is always the true phase.
    fn on_phase_change(&mut self, _from: Phase, _to: Phase, _at: EpochMillis) {}

    /// An error was recorded (or an existing record's occurrence count was
    /// bumped). Delivered for diagnostics even after a terminal phase.
    fn on_error_recorded(&mut self, _record: &ErrorRecord) {}
}
