//! Metrics collection and exposition.
//!
//! # Metrics
//! - `header_rules_applied_total` (counter): header lists applied, by `kind`
//! - `header_rules_unmatched_total` (counter): requests no rule or header list matched
//! - `header_processor_errors_total` (counter): processor failures, by `phase`
//! - `config_reloads_total` (counter): reload attempts, by `result`
//! - `header_rules_loaded` (gauge): rules in the active rule set

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with an HTTP scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_applied(kind: &'static str) {
    counter!("header_rules_applied_total", "kind" => kind).increment(1);
}

pub fn record_unmatched() {
    counter!("header_rules_unmatched_total").increment(1);
}

pub fn record_processor_error(phase: String) {
    counter!("header_processor_errors_total", "phase" => phase).increment(1);
}

pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("config_reloads_total", "result" => result).increment(1);
}

pub fn record_rules_loaded(count: usize) {
    gauge!("header_rules_loaded").set(count as f64);
}
