//! Server builder for configuring and creating the discovery gateway.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use xds_cache::{ConfigStore, EndpointSource, SnapshotProvider, StatusSource};
use xds_core::{XdsError, XdsResult};

use crate::config::ServerConfig;
use crate::gateway::Gateway;
use crate::metrics::GatewayMetrics;
use crate::shutdown::ShutdownController;
use crate::status::StatusReporter;
use crate::XdsServer;

/// Builder for creating an [`XdsServer`].
///
/// # Example
///
/// ```rust,ignore
/// use xds_server::XdsServerBuilder;
/// use xds_cache::{ConfigStore, EndpointStore};
/// use std::sync::Arc;
///
/// let server = XdsServerBuilder::new()
///     .endpoints(Arc::new(EndpointStore::new()))
///     .config_store(Arc::new(ConfigStore::new()))
///     .listen_addr("127.0.0.1:8080".parse()?)
///     .build()?;
/// ```
#[derive(Default)]
pub struct XdsServerBuilder {
    endpoints: Option<Arc<dyn EndpointSource>>,
    snapshots: Option<Arc<dyn SnapshotProvider>>,
    status: Option<Arc<dyn StatusSource>>,
    config: ServerConfig,
}

impl fmt::Debug for XdsServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XdsServerBuilder")
            .field("endpoints", &self.endpoints.is_some())
            .field("snapshots", &self.snapshots.is_some())
            .field("status", &self.status.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl XdsServerBuilder {
    /// Create a new server builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint source.
    ///
    /// This is required.
    pub fn endpoints(mut self, source: Arc<dyn EndpointSource>) -> Self {
        self.endpoints = Some(source);
        self
    }

    /// Set the snapshot provider for listener and cluster requests.
    ///
    /// This is required.
    pub fn snapshots(mut self, provider: Arc<dyn SnapshotProvider>) -> Self {
        self.snapshots = Some(provider);
        self
    }

    /// Set the status source for the status route.
    ///
    /// This is required.
    pub fn status(mut self, source: Arc<dyn StatusSource>) -> Self {
        self.status = Some(source);
        self
    }

    /// Use one [`ConfigStore`] as both snapshot provider and status source.
    pub fn config_store(self, store: Arc<ConfigStore>) -> Self {
        self.snapshots(store.clone()).status(store)
    }

    /// Replace the whole server configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the listen address.
    pub fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.config.listen_addr = addr;
        self
    }

    /// Set maximum request size in bytes.
    pub fn max_request_size(mut self, size: usize) -> Self {
        self.config.max_request_size = size;
        self
    }

    /// Set how long in-flight requests may run after a shutdown signal.
    pub fn grace_period(mut self, period: Duration) -> Self {
        self.config.grace_period = period;
        self
    }

    /// Enable request metrics (enabled by default).
    pub fn enable_metrics(mut self) -> Self {
        self.config.enable_metrics = true;
        self
    }

    /// Disable request metrics.
    pub fn disable_metrics(mut self) -> Self {
        self.config.enable_metrics = false;
        self
    }

    /// Enable or disable the per-request tracing span.
    pub fn request_tracing(mut self, enabled: bool) -> Self {
        self.config.enable_request_tracing = enabled;
        self
    }

    /// Build the server.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No endpoint source, snapshot provider or status source was provided
    /// - The maximum request size is zero
    pub fn build(self) -> XdsResult<XdsServer> {
        let endpoints = self
            .endpoints
            .ok_or_else(|| XdsError::Configuration("endpoint source is required".into()))?;
        let snapshots = self
            .snapshots
            .ok_or_else(|| XdsError::Configuration("snapshot provider is required".into()))?;
        let status = self
            .status
            .ok_or_else(|| XdsError::Configuration("status source is required".into()))?;

        if self.config.max_request_size == 0 {
            return Err(XdsError::Configuration(
                "max request size must be greater than zero".into(),
            ));
        }

        let metrics = self.config.enable_metrics.then(GatewayMetrics::new);

        Ok(XdsServer {
            gateway: Gateway::new(endpoints, snapshots),
            status: StatusReporter::new(status),
            config: self.config,
            metrics,
            shutdown: ShutdownController::new(),
        })
    }
}
