//! # xds-server
//!
//! HTTP discovery gateway for xDS control planes.
//!
//! This crate answers Envoy v2 REST discovery requests from precomputed
//! responses held in the `xds-cache` stores:
//!
//! - [`XdsServer`] - Main server type wiring the gateway into an axum router
//! - [`XdsServerBuilder`] - Builder for configuring the server
//! - [`Gateway`] - Request validation and store lookup per discovery kind
//! - [`StatusReporter`] - Control-plane refresh status for operators
//! - Request metrics through the `metrics` facade
//! - Graceful shutdown with a bounded grace period
//!
//! ## Example
//!
//! ```rust,ignore
//! use xds_server::XdsServerBuilder;
//! use xds_cache::{ConfigStore, EndpointStore};
//! use std::sync::Arc;
//!
//! let endpoints = Arc::new(EndpointStore::new());
//! let store = Arc::new(ConfigStore::new());
//!
//! let server = XdsServerBuilder::new()
//!     .endpoints(endpoints)
//!     .config_store(store)
//!     .build()?;
//!
//! // Serves until SIGTERM/SIGINT
//! server.serve().await?;
//! ```
//!
//! ## Routes
//!
//! | Route | Verb | Response |
//! |---|---|---|
//! | `/v2/discovery:endpoints` | `POST` | stored endpoint bytes for the single named cluster |
//! | `/v2/discovery:listeners` | `POST` | stored listener bytes for the requesting node |
//! | `/v2/discovery:clusters` | `POST` | stored cluster bytes for the requesting node |
//! | `/config` | `GET` | `{"last_error": "...", "last_update": "..."}` |
//! | `/healthz` | any | `ok` |
//!
//! Every error response is `{"code": <status>, "message": "..."}`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod gateway;
pub mod metrics;
mod response;
pub mod routes;
pub mod shutdown;
mod status;

pub use builder::XdsServerBuilder;
pub use config::{ServerConfig, DEFAULT_LISTEN_ADDR};
pub use gateway::{Gateway, EXACTLY_ONE_NAME};
pub use metrics::GatewayMetrics;
pub use response::ErrorResponse;
pub use routes::AppState;
pub use shutdown::{ShutdownController, ShutdownSignal};
pub use status::{StatusReport, StatusReporter};

use std::future::{Future, IntoFuture};

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{info, warn};
use xds_core::{XdsError, XdsResult};

/// The discovery gateway server.
#[derive(Debug)]
pub struct XdsServer {
    gateway: Gateway,
    status: StatusReporter,
    config: ServerConfig,
    metrics: Option<GatewayMetrics>,
    shutdown: ShutdownController,
}

impl XdsServer {
    /// Create a new builder for configuring the server.
    pub fn builder() -> XdsServerBuilder {
        XdsServerBuilder::new()
    }

    /// Get the server configuration.
    #[inline]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the discovery gateway.
    #[inline]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Get the metrics instance, if enabled.
    #[inline]
    pub fn metrics(&self) -> Option<&GatewayMetrics> {
        self.metrics.as_ref()
    }

    /// Get the shutdown controller.
    #[inline]
    pub fn shutdown_controller(&self) -> &ShutdownController {
        &self.shutdown
    }

    /// Build the router with every route configured.
    pub fn router(&self) -> Router {
        let state = AppState::new(
            self.gateway.clone(),
            self.status.clone(),
            self.metrics.clone(),
            self.config.max_request_size,
        );
        routes::router(state, &self.config, self.shutdown.clone())
    }

    /// Start the server on the configured address.
    ///
    /// Runs until SIGTERM or SIGINT, then stops accepting connections and
    /// gives in-flight requests the grace period to finish.
    pub async fn serve(self) -> XdsResult<()> {
        self.run(shutdown::wait_for_signal()).await
    }

    /// Start the server with a custom shutdown signal.
    ///
    /// This allows you to control shutdown programmatically.
    pub async fn serve_with_shutdown(self, shutdown_rx: oneshot::Receiver<()>) -> XdsResult<()> {
        self.run(async move {
            let _ = shutdown_rx.await;
        })
        .await
    }

    async fn run<F>(self, signal: F) -> XdsResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.listen_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| XdsError::transport(format!("failed to bind {addr}"), e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| XdsError::transport("failed to read local address", e))?;

        let router = self.router();
        let grace_period = self.config.grace_period;

        let trigger = self.shutdown.clone();
        let server = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                signal.await;
                trigger.trigger();
            })
            .into_future();

        let deadline = {
            let signal = self.shutdown.shutdown_signal();
            async move {
                signal.wait().await;
                tokio::time::sleep(grace_period).await;
            }
        };

        info!(addr = %local_addr, "discovery gateway listening");

        tokio::select! {
            result = server => {
                result.map_err(|e| XdsError::transport("server error", e))?;
                info!("discovery gateway stopped");
            }
            () = deadline => {
                warn!(
                    in_flight = self.shutdown.in_flight(),
                    grace_period = ?grace_period,
                    "grace period elapsed, dropping open connections"
                );
            }
        }

        Ok(())
    }
}
