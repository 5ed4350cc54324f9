//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Group assignment (results)
//! - Ticket and queue state transitions
//! - Load balancer runs

use once_cell::sync::Lazy;
use prometheus::core::Collector;
use prometheus::{IntCounter, IntCounterVec, Opts};

/// Group assignment attempts by result ("assigned", "no_capacity").
pub static ASSIGNMENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "prereg_assignments_total",
            "Group assignment attempts by result",
        ),
        &["result"],
    )
    .unwrap()
});

/// Help ticket status transitions.
pub static TICKET_TRANSITIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "prereg_ticket_transitions_total",
            "Help ticket status transitions",
        ),
        &["from", "to"],
    )
    .unwrap()
});

/// Queue ticket transitions by target status.
pub static QUEUE_TRANSITIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "prereg_queue_transitions_total",
            "Queue ticket transitions by target status",
        ),
        &["to"],
    )
    .unwrap()
});

/// Load balancer runs.
pub static BALANCE_RUNS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("prereg_balance_runs_total", "Ticket balance runs").unwrap()
});

/// All core metrics, for registration into the server's registry.
pub fn all_metrics() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(ASSIGNMENTS_TOTAL.clone()),
        Box::new(TICKET_TRANSITIONS_TOTAL.clone()),
        Box::new(QUEUE_TRANSITIONS_TOTAL.clone()),
        Box::new(BALANCE_RUNS_TOTAL.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_registrable() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
    }

    #[test]
    fn test_counters_increment() {
        let before = ASSIGNMENTS_TOTAL.with_label_values(&["assigned"]).get();
        ASSIGNMENTS_TOTAL.with_label_values(&["assigned"]).inc();
        let after = ASSIGNMENTS_TOTAL.with_label_values(&["assigned"]).get();
        assert_eq!(after, before + 1);
    }
}
