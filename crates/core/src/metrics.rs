//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Enrollment (tickets by class, rejected duplicates)
//! - Dispatch (calls by trigger, archived tickets, wait time, stale timers)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Enrollment Metrics
// =============================================================================

/// Tickets enrolled by priority class.
pub static TICKETS_ENROLLED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("callboard_tickets_enrolled_total", "Total tickets enrolled"),
        &["class"], // "priority", "normal"
    )
    .unwrap()
});

/// Enrollments rejected because the code was already waiting.
pub static DUPLICATE_ENROLLMENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "callboard_duplicate_enrollments_total",
        "Enrollments rejected for reusing an active ticket code",
    )
    .unwrap()
});

// =============================================================================
// Dispatch Metrics
// =============================================================================

/// Tickets made current, by what triggered the call.
pub static TICKETS_CALLED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("callboard_tickets_called_total", "Total ticket calls"),
        &["trigger"], // "timer", "manual", "call_next"
    )
    .unwrap()
});

/// Tickets moved to the archive.
pub static TICKETS_ARCHIVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "callboard_tickets_archived_total",
        "Total tickets archived after service",
    )
    .unwrap()
});

/// Time from enrollment to first call, in seconds.
pub static WAIT_TIME: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "callboard_wait_time_seconds",
            "Time between enrollment and first call",
        )
        .buckets(vec![5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0]),
        &["class"],
    )
    .unwrap()
});

/// Timer fires ignored because the timer had been replaced or cancelled.
pub static STALE_TIMER_FIRES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "callboard_stale_timer_fires_total",
            "Timer fires suppressed by generation mismatch",
        ),
        &["timer"], // "promote", "archive"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Enrollment
        Box::new(TICKETS_ENROLLED.clone()),
        Box::new(DUPLICATE_ENROLLMENTS.clone()),
        // Dispatch
        Box::new(TICKETS_CALLED.clone()),
        Box::new(TICKETS_ARCHIVED.clone()),
        Box::new(WAIT_TIME.clone()),
        Box::new(STALE_TIMER_FIRES.clone()),
    ]
}
