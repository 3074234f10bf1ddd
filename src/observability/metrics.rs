//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, upstream
//! - `gateway_request_duration_seconds` (histogram): time to response head
//! - `gateway_upstream_errors_total` (counter): failures by upstream, kind
//! - `gateway_upgrades_total` (counter): upgrade outcomes
//! - `gateway_active_connections` (gauge): live client connections and relays
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, upstream: &str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "upstream" => upstream.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "upstream" => upstream.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error(upstream: &str, kind: &'static str) {
    counter!(
        "gateway_upstream_errors_total",
        "upstream" => upstream.to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// `outcome` is one of `relayed`, `refused`, `rejected`, `failed`.
pub fn record_upgrade(outcome: &'static str) {
    counter!("gateway_upgrades_total", "outcome" => outcome).increment(1);
}

pub fn connection_opened() {
    gauge!("gateway_active_connections").increment(1.0);
}

pub fn connection_closed() {
    gauge!("gateway_active_connections").decrement(1.0);
}
