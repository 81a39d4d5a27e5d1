//! # xds-cache
//!
//! Resource stores read by the xDS discovery gateway.
//!
//! The stores are written by an external refresh pipeline and read by many
//! concurrent requests:
//!
//! - [`EndpointStore`] - DashMap-based store of endpoint responses by cluster name
//! - [`ConfigSnapshot`] - Immutable per-node listeners/clusters generation
//! - [`ConfigStore`] - Atomically swapped snapshot plus [`ControlPlaneStatus`]
//!
//! ## Key Design Decisions
//!
//! - Stores hold responses already serialized; readers only clone `Bytes`
//! - Snapshots are immutable and atomically replaced as a whole
//! - No lock or `DashMap` reference outlives a single lookup
//!
//! ## Example
//!
//! ```rust
//! use xds_cache::{ConfigSnapshot, ConfigStore, EndpointStore, NodeResources};
//!
//! let endpoints = EndpointStore::new();
//! endpoints.set("svc-a", "ENDPOINTS_A");
//!
//! let config = ConfigStore::new();
//! config.publish(
//!     ConfigSnapshot::builder()
//!         .version("v1")
//!         .node("edge-proxy", NodeResources::new("LISTENERS", "CLUSTERS"))
//!         .build(),
//! );
//!
//! assert!(config.snapshot().listeners("edge-proxy").is_some());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod endpoints;
mod snapshot;
mod stats;
mod store;

pub use endpoints::{EndpointSource, EndpointStore};
pub use snapshot::{ConfigSnapshot, NodeResources, SnapshotBuilder};
pub use stats::CacheStats;
pub use store::{ConfigStore, ControlPlaneStatus, SnapshotProvider, StatusSource};
