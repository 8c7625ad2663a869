//! Metrics collection and exposition.
//!
//! # Metrics
//! - `h2_dispatch_requests_total` (counter): requests by method, status
//! - `h2_dispatch_request_duration_seconds` (histogram): dispatch latency
//! - `h2_dispatch_active_connections` (gauge): open client connections
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "h2_dispatch_requests_total";
pub const REQUEST_DURATION: &str = "h2_dispatch_request_duration_seconds";
pub const ACTIVE_CONNECTIONS: &str = "h2_dispatch_active_connections";

/// Serve Prometheus metrics on `addr`. Must run inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    metrics::describe_counter!(REQUESTS_TOTAL, "Dispatched requests by method and status");
    metrics::describe_histogram!(
        REQUEST_DURATION,
        metrics::Unit::Seconds,
        "Time from stream open to response written"
    );
    metrics::describe_gauge!(ACTIVE_CONNECTIONS, "Open client connections");
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    metrics::counter!(REQUESTS_TOTAL, "method" => method.clone(), "status" => status.clone())
        .increment(1);
    metrics::histogram!(REQUEST_DURATION, "method" => method, "status" => status)
        .record(start.elapsed().as_secs_f64());
}

pub fn set_active_connections(count: u64) {
    metrics::gauge!(ACTIVE_CONNECTIONS).set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_harmless() {
        record_request("GET", 200, Instant::now());
        set_active_connections(3);
    }
}
