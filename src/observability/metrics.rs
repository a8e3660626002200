//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): handled requests by action, outcome
//! - `gateway_action_duration_seconds` (histogram): handler latency by action
//! - `gateway_rate_limited_total` (counter): admission rejections
//! - `gateway_unauthorized_total` (counter): API key rejections
//! - `gateway_rate_limit_clients` (gauge): tracked client buckets
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one envelope emission.
pub fn record_action(action: &str, outcome: &'static str, elapsed: Duration) {
    counter!("gateway_requests_total", "action" => action.to_owned(), "outcome" => outcome)
        .increment(1);
    histogram!("gateway_action_duration_seconds", "action" => action.to_owned())
        .record(elapsed.as_secs_f64());
}

pub fn record_rate_limited() {
    counter!("gateway_rate_limited_total").increment(1);
}

pub fn record_unauthorized() {
    counter!("gateway_unauthorized_total").increment(1);
}

pub fn record_tracked_clients(count: usize) {
    gauge!("gateway_rate_limit_clients").set(count as f64);
}
