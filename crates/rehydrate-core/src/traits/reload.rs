//! Reload seam. The watchdog never reloads anything itself — it asks the
//! host through this trait once the snapshot write has completed. There is
//! no cancellation of a requested reload.

use std::sync::{Arc, Mutex};

pub trait ReloadHandler: Send {
    /// Request a full client-only reload. Called at most once per page load,
    /// after the state snapshot (if any) is durably written.
    fn request_reload(&self, reason: &str);
}

/// Host wiring for contexts with no reload capability (e.g. diagnostics
/// tooling driving the machine offline).
#[derive(Debug, Default)]
pub struct NoopReload;

impl ReloadHandler for NoopReload {
    fn request_reload(&self, _reason: &str) {}
}

/// Test double that records every reload request.
#[derive(Debug, Default)]
pub struct RecordingReload {
    requests: Arc<Mutex<Vec<String>>>,
}

impl RecordingReload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the request log, usable after the handler has been
    /// moved into the watchdog.
    pub fn requests(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.requests)
    }
}

impl ReloadHandler for RecordingReload {
    fn request_reload(&self, reason: &str) {
        self.requests.lock().unwrap().push(reason.to_string());
    }
}
