//! Append-only, capacity-bounded error log with deduplication.
//!
//! Identical errors (same source, message, top stack frame) reported within
//! the dedup window collapse into one record with a bumped occurrence
//! counter. At capacity, the oldest non-fatal record is evicted first;
//! fatal records (those that triggered a phase transition) go last.

use xxhash_rust::xxh3::xxh3_64;

use crate::types::{EpochMillis, ErrorRecord, ErrorSource};

pub struct ErrorCollector {
    cap: usize,
    dedup_window_ms: u64,
    entries: Vec<ErrorRecord>,
}

impl ErrorCollector {
    pub fn new(cap: usize, dedup_window_ms: u64) -> Self {
        Self {
            cap: cap.max(1),
            dedup_window_ms,
            entries: Vec::new(),
        }
    }

    /// Stable dedup id: xxh3 over source, message, and the normalized top
    /// stack frame.
    pub fn compute_id(source: ErrorSource, message: &str, stack: Option<&str>) -> u64 {
        let frame = stack
            .and_then(|s| s.lines().map(str::trim).find(|l| !l.is_empty()))
            .unwrap_or("");
        xxh3_64(format!("{}|{}|{}", source.as_str(), message, frame).as_bytes())
    }

    /// Record an error, deduplicating against the recent log.
    /// Returns a copy of the resulting record.
    pub fn record(
        &mut self,
        source: ErrorSource,
        message: &str,
        stack: Option<&str>,
        now: EpochMillis,
    ) -> ErrorRecord {
        let id = Self::compute_id(source, message, stack);

        if let Some(existing) = self
            .entries
            .iter_mut()
            .rev()
            .find(|e| e.id == id && now.saturating_sub(e.occurred_at) <= self.dedup_window_ms)
        {
            existing.occurrences += 1;
            return existing.clone();
        }

        if self.entries.len() >= self.cap {
            self.evict_one();
        }

        let record = ErrorRecord {
            id,
            source,
            message: message.to_string(),
            stack: stack.map(str::to_string),
            occurred_at: now,
            recovered: false,
            fatal: false,
            occurrences: 1,
        };
        self.entries.push(record.clone());
        record
    }

    /// Oldest non-fatal record goes first; if everything is fatal, the
    /// oldest fatal record goes.
    fn evict_one(&mut self) {
        let idx = self
            .entries
            .iter()
            .position(|e| !e.fatal)
            .unwrap_or(0);
        self.entries.remove(idx);
    }

    /// Mark the record with the given id as having triggered a transition.
    pub fn mark_fatal(&mut self, id: u64) {
        if let Some(entry) = self.entries.iter_mut().rev().find(|e| e.id == id) {
            entry.fatal = true;
        }
    }

    /// Flag every recorded error as recovered (hydration completed anyway).
    pub fn mark_all_recovered(&mut self) {
        for entry in &mut self.entries {
            entry.recovered = true;
        }
    }

    /// Entries oldest-first.
    pub fn list(&self) -> &[ErrorRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any server-render error has been recorded.
    pub fn server_render_seen(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.source == ErrorSource::ServerRenderError)
    }

    /// Total occurrences of non-server-render errors — the count the
    /// fallback policy weighs against the error threshold. Dedup-aware so
    /// an identical-error storm still trips the threshold.
    pub fn countable_occurrences(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.source != ErrorSource::ServerRenderError)
            .map(|e| e.occurrences as usize)
            .sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
