use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Once;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref MESSAGES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "brokerding_messages_total",
        "Total messages received from MQTT"
    ))
    .unwrap();
    pub static ref STORED_READINGS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "brokerding_stored_readings_total",
        "Total readings written to the store"
    ))
    .unwrap();
    pub static ref DECODE_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "brokerding_decode_failures_total",
        "Total messages dropped because the payload could not be decoded"
    ))
    .unwrap();
    pub static ref DB_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "brokerding_db_failures_total",
        "Total failed database statements, including retried ones"
    ))
    .unwrap();
    pub static ref SKIPPED_ROWS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "brokerding_skipped_rows_total",
        "Total stored rows skipped on read because they could not be decoded"
    ))
    .unwrap();
    pub static ref INSERT_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "brokerding_insert_latency_seconds",
            "Time taken to insert one reading, including retries"
        )
        .buckets(vec![
            0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0
        ])
    )
    .unwrap();
}

static INIT: Once = Once::new();

pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY.register(Box::new(MESSAGES_TOTAL.clone())).unwrap();
        REGISTRY
            .register(Box::new(STORED_READINGS_TOTAL.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(DECODE_FAILURES_TOTAL.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(DB_FAILURES_TOTAL.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(SKIPPED_ROWS_TOTAL.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(INSERT_LATENCY_SECONDS.clone()))
            .unwrap();
    });
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
