//! Watchdog configuration, loadable from a `[watchdog]` TOML section.

use serde::{Deserialize, Serialize};

use crate::errors::WatchdogError;

/// Request-time client classification, treated as an external signal.
///
/// Bots never send a completion signal, so they get a short timeout and no
/// retries; slow devices get extra headroom before the timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClientHint {
    #[default]
    Default,
    Bot,
    SlowDevice,
}

/// Configuration for the hydration watchdog.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Automatic fallback on policy decisions. Default: true. When false,
    /// policy "fall back" outcomes become log-only events.
    pub enable_auto_fallback: Option<bool>,
    /// Hydration timeout in milliseconds. Default: 10_000.
    pub hydration_timeout_ms: Option<u64>,
    /// Timeout retries per page load. Default: 2.
    pub max_retries: Option<u32>,
    /// Persist declared user state across a forced reload. Default: true.
    pub preserve_user_state: Option<bool>,
    /// Accumulated non-fatal errors before fallback. Default: 3.
    pub error_threshold: Option<usize>,
    /// Skip-decision sliding window in milliseconds. Default: 24h.
    pub skip_decision_ttl_ms: Option<u64>,
    /// Error log capacity. Default: 50.
    pub error_log_cap: Option<usize>,
    /// Identical errors within this window collapse into one record.
    /// Default: 2_000 ms.
    pub dedup_window_ms: Option<u64>,
    /// Durable keys the snapshotter carries across a forced reload
    /// (e.g. feature-scoped user preferences).
    #[serde(default)]
    pub preserved_keys: Vec<String>,
    /// Device/bot hint from request-time detection.
    pub client_hint: Option<ClientHint>,
}

impl WatchdogConfig {
    /// Bot timeout — bots never hydrate, so fail fast.
    const BOT_TIMEOUT_MS: u64 = 1_000;

    pub fn effective_auto_fallback(&self) -> bool {
        self.enable_auto_fallback.unwrap_or(true)
    }

    /// Effective hydration timeout after applying the client hint.
    pub fn effective_timeout_ms(&self) -> u64 {
        let base = self.hydration_timeout_ms.unwrap_or(10_000);
        match self.effective_client_hint() {
            ClientHint::Default => base,
            ClientHint::Bot => Self::BOT_TIMEOUT_MS.min(base),
            ClientHint::SlowDevice => base.saturating_mul(2),
        }
    }

    /// Effective retry budget. Bots get none — immediate fallback.
    pub fn effective_max_retries(&self) -> u32 {
        match self.effective_client_hint() {
            ClientHint::Bot => 0,
            _ => self.max_retries.unwrap_or(2),
        }
    }

    pub fn effective_preserve_user_state(&self) -> bool {
        self.preserve_user_state.unwrap_or(true)
    }

    pub fn effective_error_threshold(&self) -> usize {
        self.error_threshold.unwrap_or(3)
    }

    pub fn effective_skip_ttl_ms(&self) -> u64 {
        self.skip_decision_ttl_ms.unwrap_or(86_400_000)
    }

    pub fn effective_error_log_cap(&self) -> usize {
        self.error_log_cap.unwrap_or(50)
    }

    pub fn effective_dedup_window_ms(&self) -> u64 {
        self.dedup_window_ms.unwrap_or(2_000)
    }

    pub fn effective_client_hint(&self) -> ClientHint {
        self.client_hint.unwrap_or_default()
    }

    /// Parse config from the `[watchdog]` section of a TOML document.
    /// A missing section yields defaults; a malformed one is an error.
    pub fn from_toml_str(input: &str) -> Result<Self, WatchdogError> {
        let value: toml::Value = toml::from_str(input)
            .map_err(|e| WatchdogError::Config(format!("invalid TOML: {e}")))?;
        match value.get("watchdog") {
            Some(section) => section
                .clone()
                .try_into()
                .map_err(|e| WatchdogError::Config(format!("invalid [watchdog] section: {e}"))),
            None => Ok(Self::default()),
        }
    }
}
