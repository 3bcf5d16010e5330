//! Shared types for the recovery engine: phases, error records, snapshots,
//! skip-decision records, and published status views.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Unix-epoch timestamp in milliseconds. All timing flows through
/// [`crate::traits::Clock`] so behavior is deterministic under test.
pub type EpochMillis = u64;

/// Lifecycle phase of a single page load.
///
/// `Hydrated`, `FallbackActive`, and `FallbackForced` are terminal for the
/// page load; the others are transient. Transitions never decrease
/// [`Phase::severity`] except through an explicit `reset()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initializing,
    Hydrating,
    Hydrated,
    Degraded,
    FallbackActive,
    FallbackForced,
}

impl Phase {
    /// Escalation rank. Monotone along every machine transition:
    /// Initializing < Hydrating < {Hydrated, Degraded} < fallback phases.
    pub fn severity(&self) -> u8 {
        match self {
            Phase::Initializing => 0,
            Phase::Hydrating => 1,
            Phase::Hydrated | Phase::Degraded => 2,
            Phase::FallbackActive | Phase::FallbackForced => 3,
        }
    }

    /// Terminal phases accept further events but never transition again
    /// (except via `reset()`).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Phase::Hydrated | Phase::FallbackActive | Phase::FallbackForced
        )
    }
}

/// Where a reported failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSource {
    /// The server-produced markup itself threw or was malformed. Always
    /// fatal — immediate fallback.
    ServerRenderError,
    /// Client and server markup disagree. Recoverable up to the configured
    /// error threshold.
    HydrationMismatch,
    /// An error raised while the page was (or was becoming) interactive.
    RuntimeError,
}

impl ErrorSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSource::ServerRenderError => "server_render_error",
            ErrorSource::HydrationMismatch => "hydration_mismatch",
            ErrorSource::RuntimeError => "runtime_error",
        }
    }
}

/// One deduplicated entry in the error log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Stable xxh3 hash of (source, message, normalized top stack frame).
    pub id: u64,
    pub source: ErrorSource,
    pub message: String,
    pub stack: Option<String>,
    /// Timestamp of the first occurrence.
    pub occurred_at: EpochMillis,
    /// Set when hydration later completed despite this error.
    pub recovered: bool,
    /// Set when this record triggered a phase transition. Fatal records are
    /// retained preferentially under eviction.
    pub fatal: bool,
    /// How many times this identical error was reported within the dedup
    /// window.
    pub occurrences: u32,
}

/// User-visible state persisted across a forced reload.
///
/// Written once immediately before the reload, restored exactly once after
/// it, then deleted. `consumed` never persists as `true` — the snapshot is
/// physically removed on first successful read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub captured_at: EpochMillis,
    pub entries: BTreeMap<String, String>,
    pub consumed: bool,
}

/// Durable, multi-session record that a client should bypass server-rendered
/// hydration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipDecisionRecord {
    pub should_skip: bool,
    pub reason: String,
    pub set_at: EpochMillis,
    /// Sliding expiry window. `should_skip` is honored only while
    /// `now < expires_at`, so a transient failure cannot permanently
    /// degrade a client.
    pub expires_at: EpochMillis,
    /// Diagnostic-only counter of consecutive recorded failures.
    pub failure_streak: u32,
}

impl SkipDecisionRecord {
    pub fn is_expired(&self, now: EpochMillis) -> bool {
        now >= self.expires_at
    }
}

/// Compact status view published to display consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchdogStatus {
    pub phase: Phase,
    pub error_count: usize,
    /// True once the page is usable: fully hydrated, or rendered
    /// client-only from the start.
    pub is_ready: bool,
    /// True while there is anything a non-blocking indicator might surface.
    pub has_issues: bool,
}

/// Full error list and timing, for a developer-facing diagnostic panel.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedStats {
    pub phase: Phase,
    pub started_at: Option<EpochMillis>,
    pub retry_count: u32,
    pub elapsed_ms: Option<u64>,
    pub errors: Vec<ErrorRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_is_monotone_along_machine_transitions() {
        let edges = [
            (Phase::Initializing, Phase::Hydrating),
            (Phase::Initializing, Phase::FallbackForced),
            (Phase::Hydrating, Phase::Hydrated),
            (Phase::Hydrating, Phase::Degraded),
            (Phase::Hydrating, Phase::FallbackActive),
            (Phase::Degraded, Phase::Hydrated),
            (Phase::Degraded, Phase::FallbackActive),
        ];
        for (from, to) in edges {
            assert!(
                from.severity() <= to.severity(),
                "{from:?} -> {to:?} decreases severity"
            );
        }
    }

    #[test]
    fn terminal_phases() {
        assert!(Phase::Hydrated.is_terminal());
        assert!(Phase::FallbackActive.is_terminal());
        assert!(Phase::FallbackForced.is_terminal());
        assert!(!Phase::Initializing.is_terminal());
        assert!(!Phase::Hydrating.is_terminal());
        assert!(!Phase::Degraded.is_terminal());
    }

    #[test]
    fn skip_record_expiry() {
        let record = SkipDecisionRecord {
            should_skip: true,
            reason: "timeout".to_string(),
            set_at: 1_000,
            expires_at: 2_000,
            failure_streak: 1,
        };
        assert!(!record.is_expired(1_999));
        assert!(record.is_expired(2_000));
        assert!(record.is_expired(3_000));
    }
}
