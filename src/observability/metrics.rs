//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_admission_rejections_total` (counter): denials by reason
//! - `gateway_usage_events_total` (counter): metering outcomes
//! - `gateway_decoration_faults_total` (counter): responses forwarded unmetered
//!
//! Without an installed recorder every call is a no-op, so tests need no setup.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    counter!("gateway_requests_total", "method" => method.clone(), "status" => status.clone()).increment(1);
    histogram!("gateway_request_duration_seconds", "method" => method, "status" => status)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(reason: &'static str) {
    counter!("gateway_admission_rejections_total", "reason" => reason).increment(1);
}

pub fn record_usage_event(outcome: &'static str) {
    counter!("gateway_usage_events_total", "outcome" => outcome).increment(1);
}

pub fn record_decoration_fault() {
    counter!("gateway_decoration_faults_total").increment(1);
}
