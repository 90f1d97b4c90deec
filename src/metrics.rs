//! Process-wide pipeline counters and latency accumulation

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Write-only (from the pipeline's perspective) metrics state. One
/// registry is constructed at process start and shared via `Arc`;
/// increments are atomic, with no cross-counter consistency guarantee.
#[derive(Default)]
pub struct MetricsRegistry {
    requests_total: AtomicU64,
    ambiguous_total: AtomicU64,
    clarifications_total: AtomicU64,
    resolved_total: AtomicU64,
    answer_total: AtomicU64,
    errors_total: AtomicU64,
    latency_us_sum: AtomicU64,
}

/// Point-in-time copy of every counter, for the external reporting
/// collaborator
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub ambiguous_total: u64,
    pub clarifications_total: u64,
    pub resolved_total: u64,
    pub answer_total: u64,
    pub errors_total: u64,
    pub latency_ms_sum: f64,
    pub avg_latency_ms: f64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr_requests(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_ambiguous(&self) {
        self.ambiguous_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_clarifications(&self) {
        self.clarifications_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_resolved(&self) {
        self.resolved_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_answers(&self) {
        self.answer_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_errors(&self) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_latency(&self, elapsed: Duration) {
        self.latency_us_sum
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests_total = self.requests_total.load(Ordering::Relaxed);
        let latency_ms_sum = self.latency_us_sum.load(Ordering::Relaxed) as f64 / 1000.0;
        let avg_latency_ms = if requests_total > 0 {
            round2(latency_ms_sum / requests_total as f64)
        } else {
            0.0
        };

        MetricsSnapshot {
            requests_total,
            ambiguous_total: self.ambiguous_total.load(Ordering::Relaxed),
            clarifications_total: self.clarifications_total.load(Ordering::Relaxed),
            resolved_total: self.resolved_total.load(Ordering::Relaxed),
            answer_total: self.answer_total.load(Ordering::Relaxed),
            errors_total: self.errors_total.load(Ordering::Relaxed),
            latency_ms_sum,
            avg_latency_ms,
        }
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
