//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Default listen address.
pub const DEFAULT_LISTEN_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8080);

/// Configuration for the discovery gateway server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub listen_addr: SocketAddr,
    /// Maximum request body size in bytes.
    pub max_request_size: usize,
    /// How long in-flight requests may take to finish after a shutdown signal.
    pub grace_period: Duration,
    /// Record request metrics through the `metrics` facade.
    pub enable_metrics: bool,
    /// Emit a tracing span per HTTP request.
    pub enable_request_tracing: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR,
            max_request_size: 4 * 1024 * 1024, // 4MB
            grace_period: Duration::from_secs(5),
            enable_metrics: true,
            enable_request_tracing: true,
        }
    }
}
