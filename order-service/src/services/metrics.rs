//! Metrics module for order-service.
//! Provides Prometheus metrics for order lifecycle operations.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, TextEncoder, histogram_opts, opts,
    register_histogram_vec, register_int_counter_vec,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!("order_db_query_duration_seconds", "Database query duration"),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Orders created counter
pub static ORDERS_CREATED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Successful status transition counter
pub static STATUS_TRANSITIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Rejected status transition counter
pub static TRANSITION_REJECTIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Income statement export counter
pub static EXPORTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    ORDERS_CREATED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("order_orders_created_total", "Total orders created"),
            &["order_type", "initial_status"]
        )
        .expect("Failed to register ORDERS_CREATED_TOTAL")
    });

    STATUS_TRANSITIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "order_status_transitions_total",
                "Total applied status transitions"
            ),
            &["from", "to", "actor"]
        )
        .expect("Failed to register STATUS_TRANSITIONS_TOTAL")
    });

    TRANSITION_REJECTIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "order_transition_rejections_total",
                "Total rejected status transitions by reason"
            ),
            &["reason"]
        )
        .expect("Failed to register TRANSITION_REJECTIONS_TOTAL")
    });

    EXPORTS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "order_income_exports_total",
                "Total income statement exports"
            ),
            &["format"]
        )
        .expect("Failed to register EXPORTS_TOTAL")
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

/// Record a created order.
pub fn record_order_created(order_type: &str, initial_status: &str) {
    if let Some(counter) = ORDERS_CREATED_TOTAL.get() {
        counter
            .with_label_values(&[order_type, initial_status])
            .inc();
    }
}

/// Record an applied status transition.
pub fn record_status_transition(from: &str, to: &str, actor: &str) {
    if let Some(counter) = STATUS_TRANSITIONS_TOTAL.get() {
        counter.with_label_values(&[from, to, actor]).inc();
    }
}

/// Record a rejected status transition.
pub fn record_transition_rejection(reason: &str) {
    if let Some(counter) = TRANSITION_REJECTIONS_TOTAL.get() {
        counter.with_label_values(&[reason]).inc();
    }
}

/// Record an income statement export.
pub fn record_export(format: &str) {
    if let Some(counter) = EXPORTS_TOTAL.get() {
        counter.with_label_values(&[format]).inc();
    }
}
