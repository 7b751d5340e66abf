//! Global atomic counters for poll activity.
//!
//! Counters are incremented silently by the poller. Call [`Metrics::flush`]
//! to emit current values as a single `tracing::info!` event (e.g. at the
//! end of a test suite).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, no locking.
pub struct Metrics {
    polls_started: AtomicU64,
    polls_converged: AtomicU64,
    polls_timed_out: AtomicU64,
    predicate_evaluations: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            polls_started: AtomicU64::new(0),
            polls_converged: AtomicU64::new(0),
            polls_timed_out: AtomicU64::new(0),
            predicate_evaluations: AtomicU64::new(0),
        }
    }

    /// Increment the polls-started counter by one.
    pub fn inc_polls_started(&self) {
        self.polls_started.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "polls_started", "counter incremented");
    }

    /// Increment the polls-converged counter by one.
    pub fn inc_polls_converged(&self) {
        self.polls_converged.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "polls_converged", "counter incremented");
    }

    /// Increment the polls-timed-out counter by one.
    pub fn inc_polls_timed_out(&self) {
        self.polls_timed_out.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "polls_timed_out", "counter incremented");
    }

    /// Increment the predicate-evaluations counter by one.
    pub fn inc_predicate_evaluations(&self) {
        self.predicate_evaluations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "predicate_evaluations", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            polls_started = self.polls_started(),
            polls_converged = self.polls_converged(),
            polls_timed_out = self.polls_timed_out(),
            predicate_evaluations = self.predicate_evaluations(),
        );
    }

    /// Number of polls started.
    pub fn polls_started(&self) -> u64 {
        self.polls_started.load(Ordering::Relaxed)
    }

    /// Number of polls that converged.
    pub fn polls_converged(&self) -> u64 {
        self.polls_converged.load(Ordering::Relaxed)
    }

    /// Number of polls that exhausted their attempt budget.
    pub fn polls_timed_out(&self) -> u64 {
        self.polls_timed_out.load(Ordering::Relaxed)
    }

    /// Total predicate evaluations across all polls.
    pub fn predicate_evaluations(&self) -> u64 {
        self.predicate_evaluations.load(Ordering::Relaxed)
    }
}
