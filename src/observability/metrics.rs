//! Metrics collection.
//!
//! # Metrics
//! - `lb_requests_total` (counter): dispatched requests by method, status, backend
//! - `lb_request_duration_seconds` (histogram): latency per backend
//! - `lb_backend_healthy` (gauge): 1=healthy, 0=unhealthy
//!
//! No exporter is installed here; the facade is a no-op until the embedding
//! process installs a recorder.

use std::time::Instant;

pub const REQUESTS_TOTAL: &str = "lb_requests_total";
pub const REQUEST_DURATION: &str = "lb_request_duration_seconds";
pub const BACKEND_HEALTHY: &str = "lb_backend_healthy";

/// Record one proxied request. `backend` is "none" when the pool was exhausted.
pub fn record_request(method: &str, status: u16, backend: &str, start: Instant) {
    ::metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string(),
        "backend" => backend.to_string()
    )
    .increment(1);

    ::metrics::histogram!(REQUEST_DURATION, "backend" => backend.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_backend_health(backend: &str, healthy: bool) {
    ::metrics::gauge!(BACKEND_HEALTHY, "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
