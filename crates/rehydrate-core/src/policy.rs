//! Fallback policy — the pure decision function.
//!
//! Same inputs always produce the same decision; the policy never touches
//! storage, timers, or the machine itself.

use serde::Serialize;

use crate::config::WatchdogConfig;
use crate::types::ErrorSource;

/// Why a fallback was (or would be) triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// A server-render error is unrecoverable by definition.
    ServerRenderError,
    /// Accumulated non-fatal errors reached the configured threshold.
    ErrorThreshold,
    /// The timeout fired with the retry budget exhausted.
    RetriesExhausted,
    /// Explicit override (user action or host code).
    Manual,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::ServerRenderError => "server_render_error",
            FallbackReason::ErrorThreshold => "error_threshold",
            FallbackReason::RetriesExhausted => "retries_exhausted",
            FallbackReason::Manual => "manual",
        }
    }
}

/// Snapshot of the machine state the policy is allowed to see.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext {
    /// Source of the error being reported right now, if any.
    pub new_error: Option<ErrorSource>,
    /// Whether any server-render error has been recorded this page load.
    pub server_render_seen: bool,
    /// Total occurrences of non-server-render errors (dedup-aware).
    pub countable_errors: usize,
    /// Whether this consultation was triggered by the timeout firing.
    pub timed_out: bool,
    /// Timeout retries already made this page load.
    pub retry_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyDecision {
    pub fallback: bool,
    pub reason: Option<FallbackReason>,
}

impl PolicyDecision {
    pub fn fall_back(reason: FallbackReason) -> Self {
        Self {
            fallback: true,
            reason: Some(reason),
        }
    }

    pub fn stay() -> Self {
        Self {
            fallback: false,
            reason: None,
        }
    }
}

/// Decide whether to transition to fallback mode.
pub fn decide(ctx: &PolicyContext, config: &WatchdogConfig) -> PolicyDecision {
    if ctx.server_render_seen || ctx.new_error == Some(ErrorSource::ServerRenderError) {
        return PolicyDecision::fall_back(FallbackReason::ServerRenderError);
    }
    if ctx.countable_errors >= config.effective_error_threshold() {
        return PolicyDecision::fall_back(FallbackReason::ErrorThreshold);
    }
    if ctx.timed_out && ctx.retry_count >= config.effective_max_retries() {
        return PolicyDecision::fall_back(FallbackReason::RetriesExhausted);
    }
    PolicyDecision::stay()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PolicyContext {
        PolicyContext {
            new_error: None,
            server_render_seen: false,
            countable_errors: 0,
            timed_out: false,
            retry_count: 0,
        }
    }

    #[test]
    fn server_render_error_is_immediate() {
        let decision = decide(
            &PolicyContext {
                new_error: Some(ErrorSource::ServerRenderError),
                ..ctx()
            },
            &WatchdogConfig::default(),
        );
        assert_eq!(
            decision,
            PolicyDecision::fall_back(FallbackReason::ServerRenderError)
        );
    }

    #[test]
    fn threshold_reached_exactly() {
        let config = WatchdogConfig::default(); // threshold 3
        let below = decide(
            &PolicyContext {
                countable_errors: 2,
                new_error: Some(ErrorSource::HydrationMismatch),
                ..ctx()
            },
            &config,
        );
        assert!(!below.fallback);
        let at = decide(
            &PolicyContext {
                countable_errors: 3,
                new_error: Some(ErrorSource::HydrationMismatch),
                ..ctx()
            },
            &config,
        );
        assert_eq!(at, PolicyDecision::fall_back(FallbackReason::ErrorThreshold));
    }

    #[test]
    fn timeout_respects_retry_budget() {
        let config = WatchdogConfig {
            max_retries: Some(2),
            ..Default::default()
        };
        let retries_left = decide(
            &PolicyContext {
                timed_out: true,
                retry_count: 1,
                ..ctx()
            },
            &config,
        );
        assert!(!retries_left.fallback);
        let exhausted = decide(
            &PolicyContext {
                timed_out: true,
                retry_count: 2,
                ..ctx()
            },
            &config,
        );
        assert_eq!(
            exhausted,
            PolicyDecision::fall_back(FallbackReason::RetriesExhausted)
        );
    }

    #[test]
    fn same_inputs_same_decision() {
        let config = WatchdogConfig::default();
        let input = PolicyContext {
            countable_errors: 2,
            new_error: Some(ErrorSource::RuntimeError),
            ..ctx()
        };
        assert_eq!(decide(&input, &config), decide(&input, &config));
    }
}
