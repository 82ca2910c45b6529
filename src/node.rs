//! Ambient per-node bookkeeping: the counters, gauges, and eval-error
//! reporting every transform node shares (spec.md §6-§7).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Error;

/// Counts and reports lambda-evaluation failures for one node instance.
///
/// Shared by the state-tracking nodes (and any future lambda-evaluating
/// node) so the "increment a counter, log, drop the point" recovery policy
/// (error.rs's `EvalError` doc comment) is written once.
pub struct NodeMetrics {
    name: &'static str,
    eval_errors: AtomicU64,
}

impl NodeMetrics {
    pub fn new(name: &'static str) -> Self {
        NodeMetrics { name, eval_errors: AtomicU64::new(0) }
    }

    pub fn eval_errors(&self) -> u64 {
        self.eval_errors.load(Ordering::Relaxed)
    }

    pub fn record_eval_error(&self, err: &Error) {
        self.eval_errors.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(node = self.name, error = %err, "lambda evaluation failed, dropping point");
        metrics::counter!("eval_errors_total", "node" => self.name).increment(1);
    }
}

/// A running total reported to the metrics registry under `name`, tagged
/// with the node that owns it — the Rust equivalent of an `expvar.Int` stat
/// (e.g. `fieldsDeleted`/`tagsDeleted` in `delete.go`, `fieldsDefaulted` in
/// `default.go`).
pub struct Counter {
    node: &'static str,
    name: &'static str,
    value: AtomicU64,
}

impl Counter {
    pub fn new(node: &'static str, name: &'static str) -> Self {
        Counter { node, name, value: AtomicU64::new(0) }
    }

    pub fn add(&self, n: u64) {
        if n == 0 {
            return;
        }
        self.value.fetch_add(n, Ordering::Relaxed);
        metrics::counter!(self.name, "node" => self.node).increment(n);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// A point-in-time value reported to the metrics registry — used for the
/// per-node group-cardinality gauges (`statCardinalityGauge` in
/// `group_by.go`/`sample.go`).
pub struct Gauge {
    node: &'static str,
    name: &'static str,
}

impl Gauge {
    pub fn new(node: &'static str, name: &'static str) -> Self {
        Gauge { node, name }
    }

    pub fn set(&self, value: usize) {
        metrics::gauge!(self.name, "node" => self.node).set(value as f64);
    }
}
