//! Client request metrics.
//!
//! # Metrics
//! - `http_client_requests_total` (counter): requests by method, status
//!   (`"error"` when the transport failed)
//! - `http_client_request_duration_seconds` (histogram): round-trip latency
//!   by method
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every update is a no-op
//! - Measured as transport middleware so it covers the whole inner chain

use std::time::Instant;

use tower::ServiceExt;

use crate::extension::Hook;
use crate::transport::{transport_fn, HttpRequest};

pub const REQUESTS_TOTAL: &str = "http_client_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "http_client_request_duration_seconds";

/// Order of [`metrics_hook`]: wraps a replaced transport, inside the debug dump.
pub const METRICS_ORDER: i32 = -50;

/// Count and time every round trip.
pub fn metrics_hook() -> Hook {
    Hook::new("metrics")
        .order(METRICS_ORDER)
        .handle_request(|next| {
            transport_fn(move |req: HttpRequest| {
                let next = next.clone();
                async move {
                    let start = Instant::now();
                    let method = req.method().to_string();
                    let result = next.oneshot(req).await;
                    let status = match &result {
                        Ok(res) => res.status().as_str().to_string(),
                        Err(_) => "error".to_string(),
                    };
                    record_request(&method, &status, start);
                    result
                }
            })
        })
}

/// Record one finished request.
pub fn record_request(method: &str, status: &str, start: Instant) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(REQUEST_DURATION_SECONDS, "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}
