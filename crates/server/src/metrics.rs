//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the prereg server:
//! - HTTP request metrics (latency, counts, errors)
//! - WebSocket connection metrics
//! - Portal gauges (applicants, tickets, queue) collected dynamically

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};

use prereg_core::{ApplicantFilter, QueueFilter, QueueStatus, TicketFilter, TicketStatus};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "prereg_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("prereg_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "prereg_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("prereg_auth_failures_total", "Total authentication failures"),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "prereg_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .unwrap()
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "prereg_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .unwrap()
});

/// WebSocket messages sent by type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("prereg_ws_messages_sent_total", "WebSocket messages sent"),
        &["type"],
    )
    .unwrap()
});

/// WebSocket lag events (when client falls behind).
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "prereg_ws_lag_events_total",
        "WebSocket lag events (client fell behind)",
    )
    .unwrap()
});

// =============================================================================
// Portal Gauges (collected dynamically)
// =============================================================================

/// Registered applicants.
pub static APPLICANTS_TOTAL: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("prereg_applicants_total", "Registered applicants").unwrap()
});

/// Applicants who confirmed joining their group.
pub static APPLICANTS_CONFIRMED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "prereg_applicants_confirmed",
        "Applicants with confirmed group membership",
    )
    .unwrap()
});

/// Help tickets by current status.
pub static TICKETS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("prereg_tickets_by_status", "Help ticket count by status"),
        &["status"],
    )
    .unwrap()
});

/// Today's queue tickets by current status.
pub static QUEUE_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "prereg_queue_by_status",
            "Today's queue ticket count by status",
        ),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // WebSocket
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry.register(Box::new(WS_MESSAGES_SENT.clone())).unwrap();
    registry.register(Box::new(WS_LAG_EVENTS.clone())).unwrap();

    // Portal gauges
    registry.register(Box::new(APPLICANTS_TOTAL.clone())).unwrap();
    registry
        .register(Box::new(APPLICANTS_CONFIRMED.clone()))
        .unwrap();
    registry
        .register(Box::new(TICKETS_BY_STATUS.clone()))
        .unwrap();
    registry.register(Box::new(QUEUE_BY_STATUS.clone())).unwrap();

    // Core metrics (assignment, transitions, balancing)
    for metric in prereg_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// This is called before encoding metrics to update gauges with current
/// values from the stores.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    if let Ok(count) = state.enrollment().count_applicants(&ApplicantFilter::new()) {
        APPLICANTS_TOTAL.set(count);
    }
    if let Ok(count) = state
        .enrollment()
        .count_applicants(&ApplicantFilter::new().with_join_confirmed(true))
    {
        APPLICANTS_CONFIRMED.set(count);
    }

    for status in [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Closed,
    ] {
        let filter = TicketFilter::new().with_status(status);
        if let Ok(count) = state.ticket_store().count(&filter) {
            TICKETS_BY_STATUS.with_label_values(&[status.as_str()]).set(count);
        }
    }

    for status in [
        QueueStatus::Waiting,
        QueueStatus::Called,
        QueueStatus::Serving,
        QueueStatus::Completed,
        QueueStatus::Skipped,
    ] {
        let filter = QueueFilter::new().with_status(status).today_only();
        if let Ok(count) = state.queue_store().count(&filter) {
            QUEUE_BY_STATUS.with_label_values(&[status.as_str()]).set(count);
        }
    }
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let uuid_regex = regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap();
    let numeric_regex = regex_lite::Regex::new(r"/\d+(/|$)").unwrap();

    let result = uuid_regex.replace_all(path, "{id}");
    let result = numeric_regex.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/tickets/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/tickets/{id}");
    }

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/queue/tickets/12345";
        assert_eq!(normalize_path(path), "/api/v1/queue/tickets/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("prereg_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        // Touch metrics so they appear in output (Prometheus only outputs
        // metrics that have been accessed)
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        WS_CONNECTIONS_ACTIVE.set(0);
        WS_CONNECTIONS_TOTAL.inc();
        APPLICANTS_TOTAL.set(0);
        TICKETS_BY_STATUS.with_label_values(&["open"]).set(0);
        QUEUE_BY_STATUS.with_label_values(&["waiting"]).set(0);

        let output = encode_metrics();

        assert!(output.contains("prereg_http_request_duration_seconds"));
        assert!(output.contains("prereg_http_requests_total"));
        assert!(output.contains("prereg_http_requests_in_flight"));
        assert!(output.contains("prereg_ws_connections_active"));
        assert!(output.contains("prereg_ws_connections_total"));
        assert!(output.contains("prereg_applicants_total"));
        assert!(output.contains("prereg_tickets_by_status"));
        assert!(output.contains("prereg_queue_by_status"));
    }
}
