//! Global atomic counters for Panelist observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. when a CLI command finishes).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, no allocations and no locking.
pub struct Metrics {
    saves: AtomicU64,
    save_failures: AtomicU64,
    rollbacks: AtomicU64,
    leaderboard_recomputes: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            saves: AtomicU64::new(0),
            save_failures: AtomicU64::new(0),
            rollbacks: AtomicU64::new(0),
            leaderboard_recomputes: AtomicU64::new(0),
        }
    }

    /// Increment the successful-saves counter by one.
    pub fn inc_saves(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "saves", "counter incremented");
    }

    /// Increment the failed-saves counter by one.
    pub fn inc_save_failures(&self) {
        self.save_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "save_failures", "counter incremented");
    }

    /// Increment the optimistic-rollback counter by one.
    pub fn inc_rollbacks(&self) {
        self.rollbacks.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "rollbacks", "counter incremented");
    }

    /// Increment the leaderboard-recompute counter by one.
    pub fn inc_leaderboard_recomputes(&self) {
        self.leaderboard_recomputes.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "leaderboard_recomputes", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            saves = self.saves(),
            save_failures = self.save_failures(),
            rollbacks = self.rollbacks(),
            leaderboard_recomputes = self.leaderboard_recomputes(),
        );
    }

    pub fn saves(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }

    pub fn save_failures(&self) -> u64 {
        self.save_failures.load(Ordering::Relaxed)
    }

    pub fn rollbacks(&self) -> u64 {
        self.rollbacks.load(Ordering::Relaxed)
    }

    pub fn leaderboard_recomputes(&self) -> u64 {
        self.leaderboard_recomputes.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.saves.store(0, Ordering::Relaxed);
        self.save_failures.store(0, Ordering::Relaxed);
        self.rollbacks.store(0, Ordering::Relaxed);
        self.leaderboard_recomputes.store(0, Ordering::Relaxed);
    }
}
