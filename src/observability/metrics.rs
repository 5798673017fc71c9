//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): inbound requests by method, status
//! - `relay_request_duration_seconds` (histogram): inbound latency by method
//! - `relay_forward_total` (counter): upstream calls by outcome
//! - `relay_forward_duration_seconds` (histogram): upstream latency by outcome
//!
//! Recording without an installed exporter is a no-op, so library users and
//! tests pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one inbound request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "relay_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("relay_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record one upstream call. `outcome` is `success` or an error kind.
pub fn record_forward(outcome: &'static str, start: Instant) {
    counter!("relay_forward_total", "outcome" => outcome).increment(1);
    histogram!("relay_forward_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}
