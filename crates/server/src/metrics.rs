//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the callboard server:
//! - HTTP request metrics (latency, counts, in flight)
//! - WebSocket connection metrics
//! - Queue gauges (collected dynamically from the dispatcher)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};
use tracing::warn;

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
            "callboard_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("callboard_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "callboard_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "callboard_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .unwrap()
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "callboard_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .unwrap()
});

/// WebSocket messages sent by type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("callboard_ws_messages_sent_total", "WebSocket messages sent"),
        &["type"],
    )
    .unwrap()
});

/// WebSocket lag events (when client falls behind).
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "callboard_ws_lag_events_total",
        "WebSocket lag events (client fell behind)",
    )
    .unwrap()
});

// =============================================================================
// Queue Metrics (collected dynamically)
// =============================================================================

/// Waiting tickets by priority class.
pub static QUEUE_WAITING: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("callboard_queue_waiting", "Tickets waiting to be called"),
        &["class"],
    )
    .unwrap()
});

/// Tickets in the archive.
pub static QUEUE_ARCHIVED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "callboard_queue_archived",
        "Number of tickets in the service history",
    )
    .unwrap()
});

/// Dispatcher running state (1 = running, 0 = stopped).
pub static DISPATCHER_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "callboard_dispatcher_active",
        "Whether automatic dispatching is running (1) or stopped (0)",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let server_metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // HTTP
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        // WebSocket
        Box::new(WS_CONNECTIONS_ACTIVE.clone()),
        Box::new(WS_CONNECTIONS_TOTAL.clone()),
        Box::new(WS_MESSAGES_SENT.clone()),
        Box::new(WS_LAG_EVENTS.clone()),
        // Queue
        Box::new(QUEUE_WAITING.clone()),
        Box::new(QUEUE_ARCHIVED.clone()),
        Box::new(DISPATCHER_ACTIVE.clone()),
    ];

    // Core metrics (enrollment, dispatch)
    for metric in server_metrics
        .into_iter()
        .chain(callboard_core::metrics::all_metrics())
    {
        if let Err(e) = registry.register(metric) {
            warn!("Failed to register metric: {}", e);
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the queue gauges reflect the dispatcher.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.dispatcher().status().await;

    DISPATCHER_ACTIVE.set(i64::from(status.active));
    QUEUE_WAITING
        .with_label_values(&["priority"])
        .set(status.priority_waiting as i64);
    QUEUE_WAITING
        .with_label_values(&["normal"])
        .set(status.normal_waiting as i64);
    QUEUE_ARCHIVED.set(status.archived as i64);
}

static SELECT_SEGMENT: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"/queue/select/[^/]+").unwrap());

static TICKET_CODE_SEGMENT: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"/[PpCc]\d{3}(/|$)").unwrap());

/// Normalize a path for metric labels (replace ticket ids with placeholders).
///
/// The select segment is collapsed whatever it holds, so malformed ids
/// cannot grow label cardinality.
pub fn normalize_path(path: &str) -> String {
    let result = SELECT_SEGMENT.replace_all(path, "/queue/select/{id}");
    TICKET_CODE_SEGMENT
        .replace_all(&result, "/{id}$1")
        .to_string()
}
