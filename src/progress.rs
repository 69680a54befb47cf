//! Run counters and periodic throughput/ETA reporting.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::dispatch::Outcome;

/// Per-run tallies, bumped once per outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl Counters {
    pub fn observe(&mut self, outcome: &Outcome) {
        self.total += 1;
        if outcome.ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub expected: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_secs: f64,
    pub rate_per_sec: f64,
    /// `None` until a rate can be measured.
    pub eta_secs: Option<f64>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn compute(counters: Counters, expected: usize, elapsed: Duration) -> Self {
        let elapsed_secs = elapsed.as_secs_f64();
        #[allow(clippy::cast_precision_loss)]
        let processed = counters.total as f64;
        let rate_per_sec = if elapsed_secs > 0.0 {
            processed / elapsed_secs
        } else {
            0.0
        };
        let remaining = expected.saturating_sub(counters.total);
        #[allow(clippy::cast_precision_loss)]
        let eta_secs = (rate_per_sec > 0.0).then(|| remaining as f64 / rate_per_sec);
        Self {
            processed: counters.total,
            expected,
            succeeded: counters.succeeded,
            failed: counters.failed,
            elapsed_secs,
            rate_per_sec,
            eta_secs,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

pub struct ProgressReporter {
    every: usize,
    expected: usize,
    started: Instant,
}

impl ProgressReporter {
    /// `every` is clamped to at least one completion.
    #[must_use]
    pub fn new(expected: usize, every: usize) -> Self {
        Self {
            every: every.max(1),
            expected,
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether a summary is due after `processed` completions.
    #[must_use]
    pub const fn is_due(&self, processed: usize) -> bool {
        processed > 0 && (processed % self.every == 0 || processed == self.expected)
    }

    /// Emit a summary if one is due. Returns the snapshot that was logged.
    pub fn observe(&self, counters: Counters) -> Option<ProgressSnapshot> {
        if !self.is_due(counters.total) {
            return None;
        }
        let snapshot = ProgressSnapshot::compute(counters, self.expected, self.elapsed());
        tracing::info!(
            processed = snapshot.processed,
            expected = snapshot.expected,
            ok = snapshot.succeeded,
            failed = snapshot.failed,
            elapsed_secs = round_to(snapshot.elapsed_secs, 1),
            rate = round_to(snapshot.rate_per_sec, 2),
            eta_secs = snapshot.eta_secs.map_or(-1.0, |eta| round_to(eta, 0)),
            "progress"
        );
        Some(snapshot)
    }
}
