//! Request counters and run totals.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Process-wide request counters, shared by every worker.
///
/// Workers only ever increment. The reporter drains both counters once per
/// tick with `take`.
#[derive(Debug, Default)]
pub struct Counters {
    success: AtomicU64,
    errors: AtomicU64,
}

/// Counts drained from `Counters` for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSnapshot {
    /// Every completed request, failed or not
    pub requests: u64,
    pub errors: u64,
}

impl TickSnapshot {
    pub fn successes(&self) -> u64 {
        self.requests - self.errors
    }
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counts without resetting.
    pub fn snapshot(&self) -> TickSnapshot {
        let success = self.success.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);
        TickSnapshot {
            requests: success + errors,
            errors,
        }
    }

    /// Drain both counters. Each is swapped to zero in one atomic step, so an
    /// increment racing with the reset lands in this tick or the next, never
    /// neither.
    pub fn take(&self) -> TickSnapshot {
        let success = self.success.swap(0, Ordering::AcqRel);
        let errors = self.errors.swap(0, Ordering::AcqRel);
        TickSnapshot {
            requests: success + errors,
            errors,
        }
    }
}

/// Cumulative totals over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTotals {
    pub requests: u64,
    pub errors: u64,
    pub ticks: u64,
    pub peak_qps: u64,
    pub elapsed: Duration,
}

impl RunTotals {
    /// Fold one full reporting interval in.
    pub fn record_tick(&mut self, tick: TickSnapshot, qps: u64) {
        self.absorb(tick);
        self.ticks += 1;
        self.peak_qps = self.peak_qps.max(qps);
    }

    /// Fold in counts that do not make up a full tick (e.g. at shutdown).
    pub fn absorb(&mut self, tick: TickSnapshot) {
        self.requests += tick.requests;
        self.errors += tick.errors;
    }

    /// Mean requests per second over the elapsed time.
    pub fn average_qps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.requests as f64 / secs
        } else {
            0.0
        }
    }

    /// Share of requests that failed, in percent.
    pub fn error_rate(&self) -> f64 {
        if self.requests > 0 {
            (self.errors as f64 / self.requests as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Requests per second for a tick of the given length.
pub fn qps(tick: TickSnapshot, interval: Duration) -> u64 {
    let secs = interval.as_secs_f64();
    if secs > 0.0 {
        (tick.requests as f64 / secs).round() as u64
    } else {
        tick.requests
    }
}
