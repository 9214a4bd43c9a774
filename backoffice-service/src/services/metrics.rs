//! Prometheus metrics for backoffice-service.

use once_cell::sync::Lazy;
use prometheus::{
    CounterVec, HistogramVec, TextEncoder, register_counter_vec, register_histogram_vec,
};

/// Sales import counter by outcome.
pub static SALES_IMPORTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_sales_imports_total",
        "Total number of sales file imports",
        &["outcome"] // success, malformed, unparseable_date, failed
    )
    .expect("Failed to register sales_imports_total")
});

/// Orders created/skipped during imports.
pub static IMPORTED_ORDERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_imported_orders_total",
        "Orders processed by sales imports",
        &["disposition"] // created, skipped
    )
    .expect("Failed to register imported_orders_total")
});

/// Calendar sync attempts by operation and outcome.
pub static CALENDAR_SYNC_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_calendar_sync_total",
        "Calendar sync attempts",
        &["operation", "outcome"] // create/update/delete, ok/warning
    )
    .expect("Failed to register calendar_sync_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "backoffice_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&SALES_IMPORTS_TOTAL);
    Lazy::force(&IMPORTED_ORDERS_TOTAL);
    Lazy::force(&CALENDAR_SYNC_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
