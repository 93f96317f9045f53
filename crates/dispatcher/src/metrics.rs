//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use contracts::{FlushOutcome, FlushReport};

/// Counters shared by every flush task of one dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Tasks spawned but not yet finished
    in_flight: AtomicUsize,
    /// Total flush tasks spawned
    flushes_started: AtomicU64,
    /// Total delivery attempts across all tasks
    attempts: AtomicU64,
    /// Tasks ending in OK
    delivered: AtomicU64,
    /// Tasks ending in ERROR (timeouts included)
    failed: AtomicU64,
    /// Tasks that spent their whole retry budget
    retries_exhausted: AtomicU64,
    /// Tasks cut off by the task timeout
    timed_out: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn flushes_started(&self) -> u64 {
        self.flushes_started.load(Ordering::Relaxed)
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn retries_exhausted(&self) -> u64 {
        self.retries_exhausted.load(Ordering::Relaxed)
    }

    pub fn timed_out(&self) -> u64 {
        self.timed_out.load(Ordering::Relaxed)
    }

    pub(crate) fn task_started(&self) {
        self.flushes_started.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_attempts(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn task_finished(&self, report: &FlushReport) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);

        if report.timed_out {
            self.timed_out.fetch_add(1, Ordering::Relaxed);
        }
        match report.outcome {
            FlushOutcome::Ok => self.delivered.fetch_add(1, Ordering::Relaxed),
            FlushOutcome::Error => self.failed.fetch_add(1, Ordering::Relaxed),
            FlushOutcome::Retry => self.retries_exhausted.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            in_flight: self.in_flight(),
            flushes_started: self.flushes_started(),
            attempts: self.attempts(),
            delivered: self.delivered(),
            failed: self.failed(),
            retries_exhausted: self.retries_exhausted(),
            timed_out: self.timed_out(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub in_flight: usize,
    pub flushes_started: u64,
    pub attempts: u64,
    pub delivered: u64,
    pub failed: u64,
    pub retries_exhausted: u64,
    pub timed_out: u64,
}
