//! `EventDispatcher` — fan-out of watchdog events to subscribers.
//!
//! Delivery is synchronous and in registration order; there is no batching
//! and no reordering. A handler that panics takes the page down with it,
//! which is the host's contract to uphold.

use crate::types::{EpochMillis, ErrorRecord, Phase};

use super::handler::WatchdogEventHandler;

#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Box<dyn WatchdogEventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, handler: Box<dyn WatchdogEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn emit_phase_change(&mut self, from: Phase, to: Phase, at: EpochMillis) {
        for handler in &mut self.handlers {
            handler.on_phase_change(from, to, at);
        }
    }

    pub fn emit_error_recorded(&mut self, record: &ErrorRecord) {
        for handler in &mut self.handlers {
            handler.on_error_recorded(record);
        }
    }
}
