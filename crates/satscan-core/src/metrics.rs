//! Request/row/latency observations, pushed into a sink the caller injects.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Receives one observation per client operation. Implementations must be
/// cheap; they run inline on the request path.
pub trait MetricsSink: Send + Sync {
    /// An upstream request is about to be issued for `op`.
    fn record_request(&self, op: &'static str);

    /// `rows` records were handed back to the caller for `op`.
    fn record_rows(&self, op: &'static str, rows: u64);

    /// The request for `op` finished after `elapsed`.
    fn record_latency(&self, op: &'static str, elapsed: Duration, success: bool);
}

/// Discards every observation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_request(&self, _op: &'static str) {}
    fn record_rows(&self, _op: &'static str, _rows: u64) {}
    fn record_latency(&self, _op: &'static str, _elapsed: Duration, _success: bool) {}
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OpStats {
    pub requests: u64,
    pub rows: u64,
    pub failures: u64,
    pub total_time: Duration,
}

/// Per-operation counters kept in memory, for harnesses that report them
/// themselves.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    ops: Mutex<HashMap<&'static str, OpStats>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self, op: &str) -> OpStats {
        self.ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(op)
            .cloned()
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> HashMap<&'static str, OpStats> {
        self.ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, op: &'static str, f: impl FnOnce(&mut OpStats)) {
        let mut ops = self.ops.lock().unwrap_or_else(PoisonError::into_inner);
        f(ops.entry(op).or_default());
    }
}

impl MetricsSink for InMemoryMetrics {
    fn record_request(&self, op: &'static str) {
        self.update(op, |s| s.requests += 1);
    }

    fn record_rows(&self, op: &'static str, rows: u64) {
        self.update(op, |s| s.rows += rows);
    }

    fn record_latency(&self, op: &'static str, elapsed: Duration, success: bool) {
        self.update(op, |s| {
            s.total_time += elapsed;
            if !success {
                s.failures += 1;
            }
        });
    }
}
