//! Metrics collection and exposition.
//!
//! # Metrics
//! - `notes_http_requests_total` (counter): requests by method, status
//! - `notes_http_request_duration_seconds` (histogram): latency distribution
//! - `notes_events_total` (counter): note lifecycle events (created, deleted)
//! - `notes_rate_limited_total` (counter): rejected consumes by policy
//! - `notes_listed` (histogram): notes returned per listing
//! - `notes_store_size` (gauge): persisted note count
//!
//! All recorders are no-ops until `init_metrics` installs the exporter.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "notes_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("notes_http_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_note_event(event: &'static str) {
    counter!("notes_events_total", "event" => event).increment(1);
}

pub fn record_rate_limited(policy: &str) {
    counter!("notes_rate_limited_total", "policy" => policy.to_string()).increment(1);
}

pub fn record_notes_listed(count: usize) {
    histogram!("notes_listed").record(count as f64);
}

pub fn record_store_size(size: usize) {
    gauge!("notes_store_size").set(size as f64);
}
