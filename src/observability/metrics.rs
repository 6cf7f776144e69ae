//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by resolution outcome, status
//! - `edge_request_duration_seconds` (histogram): latency by outcome
//! - `edge_store_lookups_total` (counter): lookups by store, hit/miss/error
//! - `edge_store_writes_total` (counter): writes by store, ok/error
//! - `edge_background_tasks` (gauge): pending background store writes

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request.
pub fn record_resolution(outcome: &'static str, status: u16, start: Instant) {
    counter!(
        "edge_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("edge_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record a store lookup result ("hit", "miss" or "error").
pub fn record_store_lookup(store: &'static str, result: &'static str) {
    counter!("edge_store_lookups_total", "store" => store, "result" => result).increment(1);
}

/// Record a store write.
pub fn record_store_write(store: &'static str, success: bool) {
    let result = if success { "ok" } else { "error" };
    counter!("edge_store_writes_total", "store" => store, "result" => result).increment(1);
}

pub fn record_background_tasks(pending: usize) {
    gauge!("edge_background_tasks").set(pending as f64);
}
