//! Discovery kinds and their type URLs.
//!
//! The gateway serves a closed set of discovery kinds. [`DiscoveryKind`]
//! names them; each kind knows its HTTP route, its type URL and whether it is
//! filtered by resource name or keyed by node.

use std::fmt;

/// Type URL constants for the legacy v2 REST discovery API.
#[derive(Clone, Copy, Debug)]
pub struct TypeUrl;

impl TypeUrl {
    /// Type URL for ClusterLoadAssignment (EDS).
    pub const ENDPOINT: &'static str = "type.googleapis.com/envoy.api.v2.ClusterLoadAssignment";

    /// Type URL for Listener (LDS).
    pub const LISTENER: &'static str = "type.googleapis.com/envoy.api.v2.Listener";

    /// Type URL for Cluster (CDS).
    pub const CLUSTER: &'static str = "type.googleapis.com/envoy.api.v2.Cluster";

    /// Extract the short name from a type URL.
    ///
    /// `type.googleapis.com/envoy.api.v2.Cluster` returns `Cluster`.
    #[must_use]
    pub fn short_name(type_url: &str) -> &str {
        type_url
            .rsplit('/')
            .next()
            .and_then(|s| s.rsplit('.').next())
            .unwrap_or(type_url)
    }
}

/// The discovery kinds served by the gateway.
///
/// # Example
///
/// ```rust
/// use xds_core::DiscoveryKind;
///
/// let kind = DiscoveryKind::from_path("/v2/discovery:endpoints");
/// assert_eq!(kind, Some(DiscoveryKind::Endpoints));
/// assert!(DiscoveryKind::Endpoints.is_name_filtered());
/// assert!(!DiscoveryKind::Clusters.is_name_filtered());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiscoveryKind {
    /// Endpoint Discovery Service.
    Endpoints,
    /// Listener Discovery Service.
    Listeners,
    /// Cluster Discovery Service.
    Clusters,
}

impl DiscoveryKind {
    /// All kinds, in route registration order.
    pub const ALL: [DiscoveryKind; 3] = [
        DiscoveryKind::Endpoints,
        DiscoveryKind::Listeners,
        DiscoveryKind::Clusters,
    ];

    /// HTTP route for this kind.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            DiscoveryKind::Endpoints => "/v2/discovery:endpoints",
            DiscoveryKind::Listeners => "/v2/discovery:listeners",
            DiscoveryKind::Clusters => "/v2/discovery:clusters",
        }
    }

    /// Type URL of the resources returned for this kind.
    #[must_use]
    pub const fn type_url(self) -> &'static str {
        match self {
            DiscoveryKind::Endpoints => TypeUrl::ENDPOINT,
            DiscoveryKind::Listeners => TypeUrl::LISTENER,
            DiscoveryKind::Clusters => TypeUrl::CLUSTER,
        }
    }

    /// Short label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DiscoveryKind::Endpoints => "eds",
            DiscoveryKind::Listeners => "lds",
            DiscoveryKind::Clusters => "cds",
        }
    }

    /// Whether requests of this kind select resources by name.
    ///
    /// Listeners and clusters are node-scoped: every resource for the node is
    /// returned and `resource_names` is ignored.
    #[must_use]
    pub const fn is_name_filtered(self) -> bool {
        matches!(self, DiscoveryKind::Endpoints)
    }

    /// Resolve a route path to a kind.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.path() == path)
    }
}

impl fmt::Display for DiscoveryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
