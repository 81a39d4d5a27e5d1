//! ConfigSnapshot: one immutable generation of listener and cluster config.
//!
//! A snapshot holds, for every known node, the pre-serialized listeners and
//! clusters responses computed together from the same upstream state.
//! Snapshots are:
//!
//! - **Immutable**: built once through [`SnapshotBuilder`], never modified
//! - **Versioned**: each generation carries a version string
//! - **Paired**: a node's listeners and clusters live in one [`NodeResources`]

use std::collections::HashMap;
use std::time::Instant;

use bytes::Bytes;

/// The serialized responses for one node within a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeResources {
    listeners: Bytes,
    clusters: Bytes,
}

impl NodeResources {
    /// Pair a listeners response with a clusters response.
    pub fn new(listeners: impl Into<Bytes>, clusters: impl Into<Bytes>) -> Self {
        Self {
            listeners: listeners.into(),
            clusters: clusters.into(),
        }
    }

    /// Serialized listeners response.
    #[inline]
    pub fn listeners(&self) -> &Bytes {
        &self.listeners
    }

    /// Serialized clusters response.
    #[inline]
    pub fn clusters(&self) -> &Bytes {
        &self.clusters
    }
}

/// An immutable generation of per-node configuration.
///
/// Entries are keyed by the exact node id the proxy sends.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    version: String,
    nodes: HashMap<String, NodeResources>,
    fallback: Option<NodeResources>,
    created_at: Instant,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl ConfigSnapshot {
    /// Create a new snapshot builder.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new()
    }

    /// A snapshot with no nodes, served before the first publication.
    pub fn empty() -> Self {
        SnapshotBuilder::new().build()
    }

    /// Version of this generation.
    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// When this generation was built.
    #[inline]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Resources for a node id.
    ///
    /// Falls back to the fallback entry when the node has no entry of its own.
    pub fn resources(&self, node_id: &str) -> Option<&NodeResources> {
        self.nodes.get(node_id).or(self.fallback.as_ref())
    }

    /// Serialized listeners response for a node id.
    pub fn listeners(&self, node_id: &str) -> Option<Bytes> {
        self.resources(node_id).map(|r| r.listeners.clone())
    }

    /// Serialized clusters response for a node id.
    pub fn clusters(&self, node_id: &str) -> Option<Bytes> {
        self.resources(node_id).map(|r| r.clusters.clone())
    }

    /// Check if the node has its own entry (ignoring the fallback).
    #[inline]
    pub fn contains_node(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Whether nodes without an entry get the fallback resources.
    #[inline]
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Number of dedicated node entries.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check if this snapshot serves no node at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.fallback.is_none()
    }
}

/// Builder for creating snapshots.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    version: String,
    nodes: HashMap<String, NodeResources>,
    fallback: Option<NodeResources>,
}

impl SnapshotBuilder {
    /// Create a new snapshot builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the version for this generation.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Add the resources for one node id.
    pub fn node(mut self, node_id: impl Into<String>, resources: NodeResources) -> Self {
        self.nodes.insert(node_id.into(), resources);
        self
    }

    /// Set the resources served to nodes without their own entry.
    pub fn fallback(mut self, resources: NodeResources) -> Self {
        self.fallback = Some(resources);
        self
    }

    /// Build the snapshot.
    pub fn build(self) -> ConfigSnapshot {
        ConfigSnapshot {
            version: self.version,
            nodes: self.nodes,
            fallback: self.fallback,
            created_at: Instant::now(),
        }
    }
}
