//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Transaction sends and gas resolution
//! - Receipt waits and swallowed poll errors
//! - Contract deployment outcomes

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram, register_int_counter, CounterVec, Encoder,
    Histogram, IntCounter, TextEncoder,
};

lazy_static! {
    // Transaction metrics
    pub static ref TX_SENT: IntCounter = register_int_counter!(
        "deferred_tx_transactions_sent_total",
        "Total transactions accepted by the node"
    ).unwrap();

    pub static ref GAS_ESTIMATES: CounterVec = register_counter_vec!(
        "deferred_tx_gas_estimates_total",
        "Gas resolutions by source (expected hint or node estimate)",
        &["source"]
    ).unwrap();

    // Confirmation metrics
    pub static ref RECEIPTS_OBSERVED: CounterVec = register_counter_vec!(
        "deferred_tx_receipts_observed_total",
        "Receipts observed by the check that found them",
        &["trigger"]
    ).unwrap();

    pub static ref RECEIPT_POLL_ERRORS: IntCounter = register_int_counter!(
        "deferred_tx_receipt_poll_errors_total",
        "Transient errors swallowed while polling for receipts"
    ).unwrap();

    pub static ref RECEIPT_WAIT: Histogram = register_histogram!(
        "deferred_tx_receipt_wait_seconds",
        "Time from filter installation to receipt",
        vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    ).unwrap();

    // Deployment metrics
    pub static ref CONTRACT_DEPLOYMENTS: CounterVec = register_counter_vec!(
        "deferred_tx_contract_deployments_total",
        "Contract deployments by outcome (stored or empty code)",
        &["outcome"]
    ).unwrap();
}

/// Text exposition of all registered metrics
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

// Helper functions to record metrics

pub fn record_tx_sent() {
    TX_SENT.inc();
}

pub fn record_gas_estimate(source: &str) {
    GAS_ESTIMATES.with_label_values(&[source]).inc();
}

pub fn record_receipt_observed(trigger: &str) {
    RECEIPTS_OBSERVED.with_label_values(&[trigger]).inc();
}

pub fn record_receipt_poll_error() {
    RECEIPT_POLL_ERRORS.inc();
}

pub fn record_receipt_wait(latency_secs: f64) {
    RECEIPT_WAIT.observe(latency_secs);
}

pub fn record_contract_deployment(stored: bool) {
    CONTRACT_DEPLOYMENTS
        .with_label_values(&[if stored { "stored" } else { "empty" }])
        .inc();
}
