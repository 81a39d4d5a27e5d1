//! Request metrics for the discovery gateway.
//!
//! Metrics are recorded through the `metrics` facade; the embedding process
//! decides which exporter (if any) is installed.
//!
//! - `xds_requests_total{kind}` - discovery requests received
//! - `xds_responses_total{kind,status}` - discovery responses by status code
//! - `xds_response_latency_ms{kind}` - handling latency
//! - `xds_status_requests_total{healthy}` - status route queries
//! - `xds_in_flight_requests` - requests currently being handled
//!
//! # Example
//!
//! ```rust,ignore
//! use xds_server::metrics::GatewayMetrics;
//! use xds_core::DiscoveryKind;
//!
//! let metrics = GatewayMetrics::new();
//! let timer = metrics.start(DiscoveryKind::Endpoints);
//! timer.finish(http::StatusCode::OK);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use http::StatusCode;
use metrics::{counter, gauge, histogram};
use xds_core::DiscoveryKind;

/// Metrics for the discovery gateway.
#[derive(Debug, Clone)]
pub struct GatewayMetrics {
    inner: Arc<GatewayMetricsInner>,
}

#[derive(Debug)]
struct GatewayMetricsInner {
    /// Requests currently in a discovery handler.
    in_flight: AtomicU64,
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayMetrics {
    /// Create a new metrics instance.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(GatewayMetricsInner {
                in_flight: AtomicU64::new(0),
            }),
        }
    }

    /// Record an incoming discovery request and start timing it.
    pub fn start(&self, kind: DiscoveryKind) -> LatencyTimer {
        counter!("xds_requests_total", "kind" => kind.as_str()).increment(1);
        let count = self.inner.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        gauge!("xds_in_flight_requests").set(count as f64);

        LatencyTimer {
            start: Instant::now(),
            kind,
            metrics: self.clone(),
        }
    }

    /// Record a discovery response.
    pub fn record_response(&self, kind: DiscoveryKind, status: StatusCode, latency_ms: u64) {
        counter!(
            "xds_responses_total",
            "kind" => kind.as_str(),
            "status" => status.as_u16().to_string()
        )
        .increment(1);
        histogram!("xds_response_latency_ms", "kind" => kind.as_str()).record(latency_ms as f64);
    }

    /// Record a status route query.
    pub fn record_status_request(&self, healthy: bool) {
        counter!("xds_status_requests_total", "healthy" => healthy.to_string()).increment(1);
    }

    /// Current number of in-flight discovery requests.
    pub fn in_flight(&self) -> u64 {
        self.inner.in_flight.load(Ordering::Relaxed)
    }

    fn request_done(&self) {
        let count = self.inner.in_flight.fetch_sub(1, Ordering::Relaxed) - 1;
        gauge!("xds_in_flight_requests").set(count as f64);
    }
}

/// Timer for one discovery request.
///
/// Records the response when finished. A timer dropped without `finish`
/// (client gone mid-request) only releases the in-flight slot.
#[derive(Debug)]
pub struct LatencyTimer {
    start: Instant,
    kind: DiscoveryKind,
    metrics: GatewayMetrics,
}

impl LatencyTimer {
    /// Finish the timer and record the response.
    pub fn finish(self, status: StatusCode) {
        let elapsed = self.start.elapsed();
        self.metrics
            .record_response(self.kind, status, elapsed.as_millis() as u64);
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        self.metrics.request_done();
    }
}
