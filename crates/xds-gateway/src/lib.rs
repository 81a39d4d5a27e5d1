//! # xds-gateway
//!
//! Envoy v2 REST discovery gateway.
//!
//! Proxies poll `POST /v2/discovery:{endpoints,listeners,clusters}` and get
//! back responses a refresh pipeline computed ahead of time. Operators poll
//! `GET /config` for the outcome of the last refresh.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use xds_gateway::prelude::*;
//! use std::sync::Arc;
//!
//! let endpoints = Arc::new(EndpointStore::new());
//! let store = Arc::new(ConfigStore::new());
//!
//! // The refresh pipeline publishes into the stores
//! endpoints.set("svc-a", r#"{"versionInfo":"1","resources":[]}"#);
//! store.publish(
//!     ConfigSnapshot::builder()
//!         .version("1")
//!         .node("sidecar-1", NodeResources::new(listeners, clusters))
//!         .build(),
//! );
//!
//! let server = XdsServer::builder()
//!     .endpoints(endpoints)
//!     .config_store(store)
//!     .build()?;
//! server.serve().await?;
//! ```
//!
//! ## Architecture
//!
//! - `xds-core` - Errors, node identity, type URLs and request decoding
//! - `xds-cache` - Endpoint store, config snapshots and refresh status
//! - `xds-server` - Discovery gateway and HTTP routes
//!
//! This crate re-exports all public APIs for convenience.
//!
//! ## Design Principles
//!
//! 1. **No panics in library code** - All errors are returned as `Result`
//! 2. **No locks held across a response** - Readers clone `Bytes` out of the stores
//! 3. **Bytes in, bytes out** - The gateway never re-encodes stored responses

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub use xds_cache as cache;
pub use xds_core as core;
pub use xds_server as server;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use xds_gateway::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use xds_core::{
        DiscoveryKind, DiscoveryRequest, Locality, NodeIdentity, TypeUrl, XdsError, XdsResult,
    };

    // Store types
    pub use xds_cache::{
        CacheStats, ConfigSnapshot, ConfigStore, ControlPlaneStatus, EndpointSource,
        EndpointStore, NodeResources, SnapshotBuilder, SnapshotProvider, StatusSource,
    };

    // Server types
    pub use xds_server::{
        ErrorResponse, Gateway, ServerConfig, StatusReport, StatusReporter, XdsServer,
        XdsServerBuilder,
    };
}

/// Version information for this crate.
pub mod version {
    /// Crate version.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Minimum supported Rust version.
    pub const MSRV: &str = "1.75";

    /// Get version info as a string.
    pub fn version_string() -> String {
        format!("xds-gateway {} (MSRV {})", VERSION, MSRV)
    }
}
