//! Storage key namespace.
//!
//! Durable and ephemeral storage are shared with the rest of the
//! application, so every key this engine touches lives under the
//! `rehydrate.` prefix.

/// Ephemeral-store key holding the pending [`crate::types::StateSnapshot`].
pub const SNAPSHOT_KEY: &str = "rehydrate.snapshot.v1";

/// Durable-store key holding the [`crate::types::SkipDecisionRecord`].
pub const SKIP_DECISION_KEY: &str = "rehydrate.skip.v1";
