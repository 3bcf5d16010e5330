//! `HydrationWatchdog` — the recovery state machine.
//!
//! Owns the phase, the timeout deadline, and the error log; consults the
//! fallback policy on every relevant event; drives the snapshotter and the
//! skip-decision store; publishes every transition synchronously through
//! the event dispatcher.
//!
//! Single-threaded by construction: every event-ingestion method takes
//! `&mut self`, so event arrival order is processing order and the first
//! event to reach a terminal phase wins. Later events are accepted (and
//! recorded, for diagnostics) but never transition the machine again.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::collector::ErrorCollector;
use crate::config::WatchdogConfig;
use crate::events::dispatcher::EventDispatcher;
use crate::events::handler::WatchdogEventHandler;
use crate::policy::{decide, FallbackReason, PolicyContext};
use crate::skip::SkipDecisionStore;
use crate::snapshot::StateSnapshotter;
use crate::traits::{Clock, IKeyValueStore, ReloadHandler};
use crate::types::{
    DetailedStats, EpochMillis, ErrorSource, Phase, SkipDecisionRecord, WatchdogStatus,
};

pub struct HydrationWatchdog {
    config: WatchdogConfig,
    clock: Arc<dyn Clock>,
    reload: Box<dyn ReloadHandler>,
    skip_store: SkipDecisionStore,
    /// None when `preserve_user_state` is disabled.
    snapshotter: Option<StateSnapshotter>,
    dispatcher: EventDispatcher,
    collector: ErrorCollector,
    phase: Phase,
    started: bool,
    started_at: Option<EpochMillis>,
    retry_count: u32,
    /// The armed timeout. The only cancellable resource: cleared on every
    /// terminal transition and on `reset()`.
    deadline: Option<EpochMillis>,
}

impl HydrationWatchdog {
    pub fn new(
        config: WatchdogConfig,
        durable: Arc<dyn IKeyValueStore>,
        ephemeral: Arc<dyn IKeyValueStore>,
        clock: Arc<dyn Clock>,
        reload: Box<dyn ReloadHandler>,
    ) -> Self {
        let skip_store =
            SkipDecisionStore::new(durable.clone(), clock.clone(), config.effective_skip_ttl_ms());
        let snapshotter = config.effective_preserve_user_state().then(|| {
            StateSnapshotter::new(durable.clone(), ephemeral.clone(), clock.clone())
        });
        let collector = ErrorCollector::new(
            config.effective_error_log_cap(),
            config.effective_dedup_window_ms(),
        );
        Self {
            config,
            clock,
            reload,
            skip_store,
            snapshotter,
            dispatcher: EventDispatcher::new(),
            collector,
            phase: Phase::Initializing,
            started: false,
            started_at: None,
            retry_count: 0,
            deadline: None,
        }
    }

    /// Register a status consumer. Transitions are delivered synchronously,
    /// in registration order.
    pub fn subscribe(&mut self, handler: Box<dyn WatchdogEventHandler>) {
        self.dispatcher.subscribe(handler);
    }

    /// Begin the machine for this page load. Idempotent: a second call is a
    /// no-op and does not restart the timer.
    ///
    /// Restores any pending state snapshot, then either bypasses hydration
    /// (active skip decision) or arms the timeout and waits for the
    /// completion signal.
    pub fn start(&mut self) -> WatchdogStatus {
        if self.started {
            debug!("watchdog already started — ignoring");
            return self.status();
        }
        self.started = true;
        let now = self.clock.now_millis();
        self.started_at = Some(now);

        if let Some(snapshotter) = &self.snapshotter {
            match snapshotter.restore_if_present() {
                Ok(0) => {}
                Ok(entries) => info!(entries, "restored preserved state from previous load"),
                Err(e) => warn!(error = %e, "state restore failed — continuing without it"),
            }
        }

        if self.skip_store.should_skip() {
            info!("skip decision active — rendering client-only immediately");
            self.transition(Phase::FallbackForced);
        } else {
            self.transition(Phase::Hydrating);
            self.deadline = Some(now.saturating_add(self.config.effective_timeout_ms()));
        }
        self.status()
    }

    /// The rendering layer signals the tree became interactive. No-op after
    /// a terminal phase.
    pub fn report_hydration_complete(&mut self) {
        if !self.started {
            return;
        }
        if self.phase.is_terminal() {
            debug!(phase = ?self.phase, "completion signal after terminal phase — ignored");
            return;
        }
        self.collector.mark_all_recovered();
        self.transition(Phase::Hydrated);
    }

    /// Ingest an error report. The error is always recorded; the fallback
    /// policy is consulted unless the machine is already terminal (errors
    /// after a terminal phase are diagnostics only).
    pub fn report_error(&mut self, source: ErrorSource, message: &str, stack: Option<&str>) {
        let now = self.clock.now_millis();
        let record = self.collector.record(source, message, stack, now);
        self.dispatcher.emit_error_recorded(&record);

        if !self.started || self.phase.is_terminal() {
            debug!(source = source.as_str(), phase = ?self.phase, "error recorded without transition");
            return;
        }

        let ctx = PolicyContext {
            new_error: Some(source),
            server_render_seen: self.collector.server_render_seen(),
            countable_errors: self.collector.countable_occurrences(),
            timed_out: false,
            retry_count: self.retry_count,
        };
        let decision = decide(&ctx, &self.config);
        if decision.fallback {
            let reason = decision.reason.unwrap_or(FallbackReason::Manual);
            if self.config.effective_auto_fallback() {
                self.collector.mark_fatal(record.id);
                self.enter_fallback(reason.as_str());
            } else {
                warn!(
                    reason = reason.as_str(),
                    "auto-fallback disabled — policy decision logged only"
                );
                if self.phase == Phase::Hydrating {
                    self.transition(Phase::Degraded);
                }
            }
        } else if self.phase == Phase::Hydrating {
            self.transition(Phase::Degraded);
        }
    }

    /// Host timer tick. Returns true when a timeout was processed (retry
    /// re-armed or fallback entered). Firing after a terminal transition is
    /// harmless: the deadline is already cleared.
    pub fn poll_timeout(&mut self) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        if self.phase.is_terminal() {
            return false;
        }
        let now = self.clock.now_millis();
        if now < deadline {
            return false;
        }

        let ctx = PolicyContext {
            new_error: None,
            server_render_seen: self.collector.server_render_seen(),
            countable_errors: self.collector.countable_occurrences(),
            timed_out: true,
            retry_count: self.retry_count,
        };
        let decision = decide(&ctx, &self.config);
        if decision.fallback {
            let reason = decision.reason.unwrap_or(FallbackReason::RetriesExhausted);
            if self.config.effective_auto_fallback() {
                self.enter_fallback(reason.as_str());
            } else {
                warn!(
                    reason = reason.as_str(),
                    "auto-fallback disabled — timeout exhausted, staying put"
                );
                self.deadline = None;
            }
        } else {
            self.retry_count += 1;
            self.deadline = Some(now.saturating_add(self.config.effective_timeout_ms()));
            info!(
                retry = self.retry_count,
                max_retries = self.config.effective_max_retries(),
                "hydration timeout — re-arming"
            );
        }
        true
    }

    /// Manual override: transition straight to `FallbackActive`, bypassing
    /// the policy and the auto-fallback toggle. No-op on a terminal phase.
    pub fn force_fallback(&mut self, reason: &str) {
        if self.phase.is_terminal() {
            debug!(phase = ?self.phase, "force_fallback after terminal phase — ignored");
            return;
        }
        info!(reason, "fallback forced");
        self.enter_fallback(reason);
    }

    /// Return the machine to `Initializing` and clear the error log, the
    /// retry count, and the timer. The skip decision is left intact — use
    /// [`Self::clear_skip_decision`] after a confirmed successful retry.
    pub fn reset(&mut self) {
        self.collector.clear();
        self.retry_count = 0;
        self.deadline = None;
        self.started = false;
        self.started_at = None;
        self.transition(Phase::Initializing);
    }

    /// Compact status for display consumers.
    pub fn status(&self) -> WatchdogStatus {
        let error_count = self.collector.len();
        WatchdogStatus {
            phase: self.phase,
            error_count,
            is_ready: matches!(self.phase, Phase::Hydrated | Phase::FallbackForced),
            has_issues: error_count > 0
                || matches!(self.phase, Phase::Degraded | Phase::FallbackActive),
        }
    }

    /// Full error list and timing for a diagnostic panel.
    pub fn detailed_stats(&self) -> DetailedStats {
        DetailedStats {
            phase: self.phase,
            started_at: self.started_at,
            retry_count: self.retry_count,
            elapsed_ms: self
                .started_at
                .map(|s| self.clock.now_millis().saturating_sub(s)),
            errors: self.collector.list().to_vec(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// When the host's timer should next call [`Self::poll_timeout`].
    pub fn next_deadline(&self) -> Option<EpochMillis> {
        self.deadline
    }

    /// Current skip record, regardless of expiry, for diagnostics.
    pub fn skip_decision(&self) -> Option<SkipDecisionRecord> {
        self.skip_store.current()
    }

    /// Drop the skip decision (user manually retried successfully).
    pub fn clear_skip_decision(&mut self) -> crate::errors::WatchdogResult<()> {
        self.skip_store.clear()?;
        Ok(())
    }

    /// The fallback sequence: persist the snapshot (awaited — the reload is
    /// only requested after the write result is observed), record the
    /// failure for future loads, transition, then hand off to the host.
    /// Storage failures are logged, never allowed to abort the transition.
    fn enter_fallback(&mut self, reason: &str) {
        if let Some(snapshotter) = &self.snapshotter {
            match snapshotter.capture(&self.config.preserved_keys) {
                Ok(entries) => debug!(entries, "state captured before fallback reload"),
                Err(e) => warn!(error = %e, "state capture failed — falling back without snapshot"),
            }
        }
        if let Err(e) = self.skip_store.record_failure(reason) {
            warn!(error = %e, "failed to record skip decision");
        }
        self.transition(Phase::FallbackActive);
        self.reload.request_reload(reason);
    }

    fn transition(&mut self, to: Phase) {
        if self.phase == to {
            return;
        }
        let from = self.phase;
        self.phase = to;
        if to.is_terminal() {
            self.deadline = None;
        }
        let at = self.clock.now_millis();
        info!(from = ?from, to = ?to, "phase transition");
        self.dispatcher.emit_phase_change(from, to, at);
    }
}
