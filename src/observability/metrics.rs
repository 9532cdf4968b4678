//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lifecycle_shutdowns_total` (counter): supervisor runs by outcome
//! - `lifecycle_registrations_total` (counter): registry announcements by result
//! - `http_requests_in_flight` (gauge): requests currently being served

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_shutdown(outcome: &'static str) {
    counter!("lifecycle_shutdowns_total", "outcome" => outcome).increment(1);
}

pub fn record_registration(success: bool) {
    let result = if success { "ok" } else { "error" };
    counter!("lifecycle_registrations_total", "result" => result).increment(1);
}

pub fn record_in_flight(count: u64) {
    gauge!("http_requests_in_flight").set(count as f64);
}
