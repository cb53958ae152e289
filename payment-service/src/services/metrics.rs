//! Metrics module for payment-service.
//! Provides Prometheus metrics for checkout and reconciliation.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, TextEncoder, histogram_opts, opts,
    register_histogram_vec, register_int_counter_vec,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "payment_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Checkout sessions created counter
pub static SESSIONS_CREATED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Payment status settlements counter
pub static PAYMENTS_SETTLED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Webhook events counter
pub static WEBHOOK_EVENTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    SESSIONS_CREATED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "payment_sessions_created_total",
                "Total checkout sessions created"
            ),
            &["payment_type"]
        )
        .expect("Failed to register SESSIONS_CREATED_TOTAL")
    });

    PAYMENTS_SETTLED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "payment_settlements_total",
                "Total payments settled to a terminal status"
            ),
            &["status", "source"]
        )
        .expect("Failed to register PAYMENTS_SETTLED_TOTAL")
    });

    WEBHOOK_EVENTS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "payment_webhook_events_total",
                "Total webhook events by type and outcome"
            ),
            &["event_type", "outcome"]
        )
        .expect("Failed to register WEBHOOK_EVENTS_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Failed to convert metrics to string")
}

/// Record a created checkout session.
pub fn record_session_created(payment_type: &str) {
    if let Some(counter) = SESSIONS_CREATED_TOTAL.get() {
        counter.with_label_values(&[payment_type]).inc();
    }
}

/// Record a payment settling to a terminal status.
pub fn record_settlement(status: &str, source: &str) {
    if let Some(counter) = PAYMENTS_SETTLED_TOTAL.get() {
        counter.with_label_values(&[status, source]).inc();
    }
}

/// Record a processed webhook event.
pub fn record_webhook_event(event_type: &str, outcome: &str) {
    if let Some(counter) = WEBHOOK_EVENTS_TOTAL.get() {
        counter.with_label_values(&[event_type, outcome]).inc();
    }
}
