//! # xds-core
//!
//! Core types and error handling for the xDS discovery gateway.
//!
//! This crate provides the foundational types used across the other crates:
//!
//! - [`XdsError`] - Error type with HTTP status code mapping
//! - [`DiscoveryRequest`] - Decoded discovery request
//! - [`DiscoveryKind`] - The closed set of discovery kinds served
//! - [`NodeIdentity`] - Proxy identity; snapshots are keyed by its id
//! - [`TypeUrl`] - Type URL constants
//!
//! ## Example
//!
//! ```rust
//! use xds_core::{DiscoveryKind, DiscoveryRequest};
//!
//! let body = br#"{"node": {"id": "edge-proxy", "locality": {"zone": "a"}}}"#;
//! let request = DiscoveryRequest::decode(DiscoveryKind::Listeners, body).unwrap();
//!
//! assert_eq!(request.node_id(), Some("edge-proxy"));
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod node;
mod request;
mod type_url;

pub use error::XdsError;
pub use node::{BuildVersion, Extension, JsonObject, Locality, NodeIdentity, SemanticVersion};
pub use request::{DiscoveryRequest, ErrorDetail};
pub use type_url::{DiscoveryKind, TypeUrl};

/// Result type alias using [`XdsError`].
pub type Result<T> = std::result::Result<T, XdsError>;

/// Alias for [`Result`].
pub type XdsResult<T> = Result<T>;
