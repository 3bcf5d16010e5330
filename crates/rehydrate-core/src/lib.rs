//! # rehydrate-core
//!
//! Foundation crate for the Rehydrate recovery engine.
//! Defines the hydration watchdog state machine, fallback policy, error
//! collector, state snapshot transfer, skip-decision store, and the shared
//! types, traits, errors, and config every other crate depends on.

pub mod collector;
pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod logging;
pub mod policy;
pub mod skip;
pub mod snapshot;
pub mod traits;
pub mod types;
pub mod watchdog;

// Re-export the most commonly used types at the crate root.
pub use collector::ErrorCollector;
pub use config::{ClientHint, WatchdogConfig};
pub use errors::{StorageError, WatchdogError, WatchdogResult};
pub use events::dispatcher::EventDispatcher;
pub use events::handler::WatchdogEventHandler;
pub use policy::{decide, FallbackReason, PolicyContext, PolicyDecision};
pub use skip::SkipDecisionStore;
pub use snapshot::StateSnapshotter;
pub use traits::{
    Clock, IKeyValueStore, ManualClock, MemoryStore, NoopReload, RecordingReload, ReloadHandler,
    WallClock,
};
pub use types::{
    DetailedStats, EpochMillis, ErrorRecord, ErrorSource, Phase, SkipDecisionRecord,
    StateSnapshot, WatchdogStatus,
};
pub use watchdog::HydrationWatchdog;
