//! Discovery gateway: validates decoded requests and selects stored bytes.
//!
//! The gateway never builds response bodies. Endpoint responses come from an
//! [`EndpointSource`] keyed by cluster name; listener and cluster responses
//! come from the current [`ConfigSnapshot`](xds_cache::ConfigSnapshot) keyed
//! by the requesting node.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, instrument, warn};
use xds_cache::{EndpointSource, NodeResources, SnapshotProvider};
use xds_core::{DiscoveryKind, DiscoveryRequest, TypeUrl, XdsError, XdsResult};

/// Reason returned when an endpoint request names zero or several clusters.
pub const EXACTLY_ONE_NAME: &str = "must have exactly 1 resource name";

/// Answers discovery requests from the resource stores.
#[derive(Clone)]
pub struct Gateway {
    endpoints: Arc<dyn EndpointSource>,
    snapshots: Arc<dyn SnapshotProvider>,
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}

impl Gateway {
    /// Create a gateway over the given stores.
    pub fn new(endpoints: Arc<dyn EndpointSource>, snapshots: Arc<dyn SnapshotProvider>) -> Self {
        Self {
            endpoints,
            snapshots,
        }
    }

    /// Decode a raw request body and answer it.
    pub fn fetch(&self, kind: DiscoveryKind, body: &[u8]) -> XdsResult<Bytes> {
        let request = DiscoveryRequest::decode(kind, body).map_err(|e| {
            warn!(kind = %kind, error = %e, "failed to decode discovery request");
            e
        })?;
        self.discover(kind, &request)
    }

    /// Answer a decoded discovery request.
    #[instrument(skip(self, request), fields(node = request.node_id().unwrap_or("")))]
    pub fn discover(&self, kind: DiscoveryKind, request: &DiscoveryRequest) -> XdsResult<Bytes> {
        if request.is_nack() {
            debug!(
                version = %request.version_info,
                nonce = %request.response_nonce,
                "request carries error detail from a rejected update"
            );
        }

        if !kind.is_name_filtered() && !request.resource_names.is_empty() {
            debug!(
                count = request.resource_names.len(),
                "ignoring resource names for node-scoped request"
            );
        }

        match kind {
            DiscoveryKind::Endpoints => self.endpoints(request),
            DiscoveryKind::Listeners => self.node_scoped(kind, request, NodeResources::listeners),
            DiscoveryKind::Clusters => self.node_scoped(kind, request, NodeResources::clusters),
        }
    }

    fn endpoints(&self, request: &DiscoveryRequest) -> XdsResult<Bytes> {
        let [name] = request.resource_names.as_slice() else {
            warn!(
                count = request.resource_names.len(),
                "rejecting endpoint request"
            );
            return Err(XdsError::invalid_request(TypeUrl::ENDPOINT, EXACTLY_ONE_NAME));
        };

        self.endpoints.get_endpoints(name).ok_or_else(|| {
            debug!(cluster = %name, "no endpoints stored");
            XdsError::not_found(TypeUrl::ENDPOINT, name.as_str())
        })
    }

    fn node_scoped(
        &self,
        kind: DiscoveryKind,
        request: &DiscoveryRequest,
        select: fn(&NodeResources) -> &Bytes,
    ) -> XdsResult<Bytes> {
        let node_id = request.node_id().unwrap_or_default();
        let snapshot = self.snapshots.current_snapshot();

        let found = request
            .node_id()
            .and_then(|id| snapshot.resources(id))
            .map(|resources| select(resources).clone());
        self.snapshots.record_lookup(found.is_some());

        found.ok_or_else(|| {
            debug!(
                node = %node_id,
                version = %snapshot.version(),
                resource = TypeUrl::short_name(kind.type_url()),
                "no snapshot entry for node"
            );
            XdsError::not_found(kind.type_url(), node_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use xds_cache::{ConfigSnapshot, ConfigStore, EndpointStore};
    use xds_core::NodeIdentity;

    use super::*;

    const ENDPOINTS_A: &[u8] = br#"{"version_info":"1","resources":[{"cluster_name":"svc-a"}]}"#;

    fn request(names: &[&str], node: Option<&str>) -> DiscoveryRequest {
        DiscoveryRequest {
            resource_names: names.iter().map(|n| n.to_string()).collect(),
            node: node.map(NodeIdentity::new),
            ..Default::default()
        }
    }

    fn gateway() -> (Gateway, Arc<EndpointStore>, Arc<ConfigStore>) {
        let endpoints = Arc::new(EndpointStore::new());
        endpoints.set("svc-a", Bytes::from_static(ENDPOINTS_A));

        let store = Arc::new(ConfigStore::new());
        store.publish(
            ConfigSnapshot::builder()
                .version("v1")
                .node("node-1", NodeResources::new("L1", "C1"))
                .build(),
        );

        let gateway = Gateway::new(endpoints.clone(), store.clone());
        (gateway, endpoints, store)
    }

    #[test]
    fn endpoints_returns_stored_bytes() {
        let (gateway, _, _) = gateway();
        let body = gateway
            .discover(DiscoveryKind::Endpoints, &request(&["svc-a"], None))
            .unwrap();
        assert_eq!(body.as_ref(), ENDPOINTS_A);
    }

    #[test]
    fn endpoints_require_exactly_one_name() {
        let (gateway, _, _) = gateway();

        for names in [&[][..], &["svc-a", "svc-b"][..]] {
            let err = gateway
                .discover(DiscoveryKind::Endpoints, &request(names, None))
                .unwrap_err();
            assert!(matches!(err, XdsError::InvalidRequest { .. }));
            assert_eq!(err.client_message(), EXACTLY_ONE_NAME);
        }
    }

    #[test]
    fn endpoints_missing_name_is_not_found() {
        let (gateway, _, _) = gateway();
        let err = gateway
            .discover(DiscoveryKind::Endpoints, &request(&["svc-z"], None))
            .unwrap_err();
        assert!(matches!(err, XdsError::ResourceNotFound { .. }));
    }

    #[test]
    fn listeners_and_clusters_by_node() {
        let (gateway, _, _) = gateway();
        let req = request(&["ignored", "names"], Some("node-1"));

        let listeners = gateway.discover(DiscoveryKind::Listeners, &req).unwrap();
        let clusters = gateway.discover(DiscoveryKind::Clusters, &req).unwrap();

        assert_eq!(listeners.as_ref(), b"L1");
        assert_eq!(clusters.as_ref(), b"C1");
    }

    #[test]
    fn unknown_or_missing_node_is_not_found() {
        let (gateway, _, _) = gateway();

        for req in [request(&[], Some("node-9")), request(&[], None)] {
            let err = gateway.discover(DiscoveryKind::Listeners, &req).unwrap_err();
            assert!(matches!(err, XdsError::ResourceNotFound { .. }));
        }
    }

    #[test]
    fn fallback_entry_serves_unknown_nodes() {
        let (gateway, _, store) = gateway();
        store.publish(
            ConfigSnapshot::builder()
                .version("v2")
                .fallback(NodeResources::new("L*", "C*"))
                .build(),
        );

        let body = gateway
            .discover(DiscoveryKind::Clusters, &request(&[], Some("anyone")))
            .unwrap();
        assert_eq!(body.as_ref(), b"C*");
    }

    #[test]
    fn fetch_decodes_then_discovers() {
        let (gateway, _, _) = gateway();

        let body = gateway
            .fetch(DiscoveryKind::Endpoints, br#"{"resourceNames":["svc-a"]}"#)
            .unwrap();
        assert_eq!(body.as_ref(), ENDPOINTS_A);

        let err = gateway
            .fetch(DiscoveryKind::Endpoints, b"{not json")
            .unwrap_err();
        assert!(matches!(err, XdsError::DecodingError { .. }));
    }

    #[test]
    fn identical_requests_are_idempotent() {
        let (gateway, _, _) = gateway();
        let req = request(&[], Some("node-1"));

        let first = gateway.discover(DiscoveryKind::Listeners, &req).unwrap();
        let second = gateway.discover(DiscoveryKind::Listeners, &req).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn node_lookups_are_counted() {
        let (gateway, _, store) = gateway();

        gateway
            .discover(DiscoveryKind::Listeners, &request(&[], Some("node-1")))
            .unwrap();
        gateway
            .discover(DiscoveryKind::Clusters, &request(&[], Some("node-1")))
            .unwrap();
        let _ = gateway.discover(DiscoveryKind::Listeners, &request(&[], Some("zz")));
        let _ = gateway.discover(DiscoveryKind::Clusters, &request(&[], None));

        assert_eq!(store.stats().hits(), 2);
        assert_eq!(store.stats().misses(), 2);
    }

    #[test]
    fn node_ids_are_matched_exactly() {
        let (gateway, _, _) = gateway();

        for id in ["node-1 ", "Node-1", "node-10"] {
            let err = gateway
                .discover(DiscoveryKind::Listeners, &request(&[], Some(id)))
                .unwrap_err();
            assert!(matches!(err, XdsError::ResourceNotFound { .. }), "{id}");
        }
    }

    #[test]
    fn reads_stay_within_one_generation() {
        let (gateway, _, store) = gateway();
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let store = store.clone();
            let done = done.clone();
            thread::spawn(move || {
                for generation in 0..500 {
                    store.publish(
                        ConfigSnapshot::builder()
                            .version(generation.to_string())
                            .node(
                                "node-1",
                                NodeResources::new(
                                    format!("L{generation}"),
                                    format!("C{generation}"),
                                ),
                            )
                            .build(),
                    );
                }
                done.store(true, Ordering::SeqCst);
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let gateway = gateway.clone();
                let done = done.clone();
                thread::spawn(move || {
                    let req = request(&[], Some("node-1"));
                    loop {
                        let body = gateway.discover(DiscoveryKind::Listeners, &req).unwrap();
                        assert!(body.starts_with(b"L"));
                        if done.load(Ordering::SeqCst) {
                            break;
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        let last = gateway
            .discover(DiscoveryKind::Clusters, &request(&[], Some("node-1")))
            .unwrap();
        assert_eq!(last.as_ref(), b"C499");
    }
}
