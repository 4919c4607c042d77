use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static LIFECYCLE_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "capital_m_lifecycle_events_total",
        "Investment lifecycle transitions by entity and event",
        &["entity", "event"]
    )
    .expect("register lifecycle_events_total")
});

pub static NOTIFICATION_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "capital_m_notification_failures_total",
        "Best-effort notifications that failed to deliver",
        &["channel"]
    )
    .expect("register notification_failures_total")
});

pub static PORTFOLIO_FETCH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "capital_m_portfolio_fetch_total",
        "External portfolio provider fetches by outcome",
        &["outcome"]
    )
    .expect("register portfolio_fetch_total")
});

pub fn record(entity: &str, event: &str) {
    LIFECYCLE_EVENTS_TOTAL.with_label_values(&[entity, event]).inc();
}

/// Encode the default registry in the Prometheus text format.
pub fn gather_text() -> String {
    Lazy::force(&LIFECYCLE_EVENTS_TOTAL);
    Lazy::force(&NOTIFICATION_FAILURES_TOTAL);
    Lazy::force(&PORTFOLIO_FETCH_TOTAL);
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    if encoder.encode(&prometheus::gather(), &mut buf).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
