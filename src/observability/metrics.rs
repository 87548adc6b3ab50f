//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): dispatch attempts by backend
//! - `dispatch_failures_total` (counter): failed backend calls by backend
//! - `dispatch_queue_length` (gauge): items waiting in the work queue
//! - `dispatch_backend_rate` (gauge): smoothed events/sec by backend
//! - `dispatch_active_workers` (gauge): worker loops currently running
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; with no recorder installed
//!   every call is a no-op, so library users and tests pay nothing
//! - Prometheus exposition is opt-in from the binary

use std::net::SocketAddr;
use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with an HTTP scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics exporter listening");
    Ok(())
}

pub fn record_dispatch(backend: &str) {
    counter!("dispatch_requests_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_dispatch_failure(backend: &str) {
    counter!("dispatch_failures_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_queue_length(len: usize) {
    gauge!("dispatch_queue_length").set(len as f64);
}

pub fn record_backend_rate(backend: &str, rate: f64) {
    gauge!("dispatch_backend_rate", "backend" => backend.to_string()).set(rate);
}

pub fn record_active_workers(count: usize) {
    gauge!("dispatch_active_workers").set(count as f64);
}
