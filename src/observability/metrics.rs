//! Metrics registry
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe but lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for one class registry
///
/// Relaxed ordering throughout; counters are independent.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    classes_defined: AtomicU64,
    fields_declared: AtomicU64,
    instances_constructed: AtomicU64,
    gate_checks: AtomicU64,
    gate_denials: AtomicU64,
    validations: AtomicU64,
    validation_failures: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Class or role registered
    pub fn increment_classes(&self) {
        self.classes_defined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_fields(&self) {
        self.fields_declared.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_instances(&self) {
        self.instances_constructed.fetch_add(1, Ordering::Relaxed);
    }

    /// Gate evaluated (permitted or not)
    pub fn increment_gate_checks(&self) {
        self.gate_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_gate_denials(&self) {
        self.gate_denials.fetch_add(1, Ordering::Relaxed);
    }

    /// Validation run; `failures` is the number of messages produced
    pub fn record_validation(&self, failures: usize) {
        self.validations.fetch_add(1, Ordering::Relaxed);
        self.validation_failures
            .fetch_add(failures as u64, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            classes: self.classes_defined.load(Ordering::Relaxed),
            fields: self.fields_declared.load(Ordering::Relaxed),
            instances: self.instances_constructed.load(Ordering::Relaxed),
            gate_checks: self.gate_checks.load(Ordering::Relaxed),
            gate_denials: self.gate_denials.load(Ordering::Relaxed),
            validations: self.validations.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
        }
    }

    /// Get current snapshot of all metrics as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub classes: u64,
    pub fields: u64,
    pub instances: u64,
    pub gate_checks: u64,
    pub gate_denials: u64,
    pub validations: u64,
    pub validation_failures: u64,
}
