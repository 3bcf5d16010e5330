//! Shared traits used across Rehydrate crates, plus the in-memory store
//! and the test doubles for the clock and reload seams.

pub mod clock;
pub mod reload;
pub mod storage;

pub use clock::{Clock, ManualClock, WallClock};
pub use reload::{NoopReload, RecordingReload, ReloadHandler};
pub use storage::{IKeyValueStore, MemoryStore};
