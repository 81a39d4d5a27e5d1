//! Config store: the current snapshot generation and refresh status.
//!
//! The refresh pipeline builds a complete [`ConfigSnapshot`] off to the side
//! and publishes it with a single atomic pointer swap. Readers load one
//! `Arc` per call and keep using it for the whole call, so a call never sees
//! listeners from one generation and clusters from another.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::snapshot::ConfigSnapshot;
use crate::stats::CacheStats;

/// Read side of the snapshot store.
pub trait SnapshotProvider: Send + Sync {
    /// The currently published generation.
    fn current_snapshot(&self) -> Arc<ConfigSnapshot>;

    /// Record the outcome of a node lookup served from this provider.
    fn record_lookup(&self, _found: bool) {}
}

/// Read side of the refresh status.
pub trait StatusSource: Send + Sync {
    /// The most recently recorded status.
    fn current_status(&self) -> Arc<ControlPlaneStatus>;
}

/// Outcome of the most recent refresh attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlPlaneStatus {
    /// When the attempt finished. The Unix epoch before any attempt.
    pub last_update: DateTime<Utc>,
    /// Error text if the attempt failed.
    pub last_error: Option<String>,
}

impl ControlPlaneStatus {
    /// A successful refresh at `at`.
    pub fn ok(at: DateTime<Utc>) -> Self {
        Self {
            last_update: at,
            last_error: None,
        }
    }

    /// A failed refresh at `at`.
    pub fn failed(at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            last_update: at,
            last_error: Some(error.into()),
        }
    }

    /// Whether the last attempt succeeded.
    #[inline]
    pub fn is_healthy(&self) -> bool {
        self.last_error.is_none()
    }
}

/// Holds the published snapshot and the refresh status.
///
/// One writer, many readers: reads are a single atomic load, writes replace
/// the whole value.
pub struct ConfigStore {
    snapshot: ArcSwap<ConfigSnapshot>,
    status: ArcSwap<ControlPlaneStatus>,
    stats: CacheStats,
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("version", &self.snapshot.load().version())
            .field("status", &**self.status.load())
            .finish()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Create a store holding an empty snapshot and a default status.
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(ConfigSnapshot::empty()),
            status: ArcSwap::from_pointee(ControlPlaneStatus::default()),
            stats: CacheStats::new(),
        }
    }

    /// Get store statistics.
    #[inline]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// The currently published generation.
    #[inline]
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.snapshot.load_full()
    }

    /// The most recently recorded status.
    #[inline]
    pub fn status(&self) -> Arc<ControlPlaneStatus> {
        self.status.load_full()
    }

    /// Publish a new generation and record a successful refresh.
    pub fn publish(&self, snapshot: ConfigSnapshot) {
        self.publish_at(snapshot, Utc::now());
    }

    /// Publish a new generation and record a successful refresh at `at`.
    pub fn publish_at(&self, snapshot: ConfigSnapshot, at: DateTime<Utc>) {
        debug!(
            version = %snapshot.version(),
            nodes = snapshot.node_count(),
            "publishing snapshot"
        );

        self.snapshot.store(Arc::new(snapshot));
        self.status.store(Arc::new(ControlPlaneStatus::ok(at)));
        self.stats.record_publish();
    }

    /// Record a failed refresh attempt. The published snapshot is kept.
    pub fn record_error(&self, error: impl fmt::Display) {
        let message = error.to_string();
        warn!(error = %message, "snapshot refresh failed");

        self.status
            .store(Arc::new(ControlPlaneStatus::failed(Utc::now(), message)));
        self.stats.record_refresh_error();
    }

    /// Replace the status directly.
    pub fn set_status(&self, status: ControlPlaneStatus) {
        self.status.store(Arc::new(status));
    }

    /// Listeners for a node from the current generation.
    pub fn listeners(&self, node_id: &str) -> Option<Bytes> {
        let result = self.snapshot().listeners(node_id);
        self.stats.record_lookup(result.is_some());
        result
    }

    /// Clusters for a node from the current generation.
    pub fn clusters(&self, node_id: &str) -> Option<Bytes> {
        let result = self.snapshot().clusters(node_id);
        self.stats.record_lookup(result.is_some());
        result
    }
}

impl SnapshotProvider for ConfigStore {
    fn current_snapshot(&self) -> Arc<ConfigSnapshot> {
        self.snapshot()
    }

    fn record_lookup(&self, found: bool) {
        self.stats.record_lookup(found);
    }
}

impl StatusSource for ConfigStore {
    fn current_status(&self) -> Arc<ControlPlaneStatus> {
        self.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::NodeResources;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    fn generation(i: usize) -> ConfigSnapshot {
        ConfigSnapshot::builder()
            .version(format!("v{i}"))
            .node(
                "edge-proxy",
                NodeResources::new(format!("LDS-{i}"), format!("CDS-{i}")),
            )
            .build()
    }

    #[test]
    fn store_starts_empty_and_healthy() {
        let store = ConfigStore::new();

        assert!(store.snapshot().is_empty());
        let status = store.status();
        assert!(status.is_healthy());
        assert_eq!(status.last_update.timestamp(), 0);
    }

    #[test]
    fn publish_swaps_generation() {
        let store = ConfigStore::new();
        let node = "edge-proxy";

        store.publish(generation(1));
        let before = store.snapshot();
        store.publish(generation(2));

        assert_eq!(before.version(), "v1");
        assert_eq!(before.listeners(node).unwrap(), "LDS-1");
        assert_eq!(store.snapshot().version(), "v2");
        assert_eq!(store.clusters(node).unwrap(), "CDS-2");
        assert_eq!(store.stats().publishes(), 2);
    }

    #[test]
    fn record_error_keeps_snapshot() {
        let store = ConfigStore::new();
        store.publish(generation(1));

        store.record_error("kubernetes api unavailable");

        let status = store.status();
        assert_eq!(
            status.last_error.as_deref(),
            Some("kubernetes api unavailable")
        );
        assert_eq!(store.snapshot().version(), "v1");
        assert_eq!(store.stats().refresh_errors(), 1);

        store.publish(generation(2));
        assert!(store.status().is_healthy());
    }

    #[test]
    fn publish_at_records_time() {
        let store = ConfigStore::new();
        let at = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        store.publish_at(generation(1), at);
        assert_eq!(store.status().last_update, at);
    }

    #[test]
    fn lookups_record_stats() {
        let store = ConfigStore::new();
        store.publish(generation(1));

        assert!(store.listeners("edge-proxy").is_some());
        assert!(store.listeners("unknown").is_none());
        assert_eq!(store.stats().hits(), 1);
        assert_eq!(store.stats().misses(), 1);

        SnapshotProvider::record_lookup(&store, true);
        assert_eq!(store.stats().hits(), 2);
    }

    #[test]
    fn readers_never_see_mixed_generations() {
        let store = Arc::new(ConfigStore::new());
        store.publish(generation(0));

        let done = Arc::new(AtomicBool::new(false));
        let reads = Arc::new(AtomicUsize::new(0));
        let mut readers = vec![];

        for _ in 0..4 {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            let reads = Arc::clone(&reads);
            readers.push(thread::spawn(move || {
                let node = "edge-proxy";
                loop {
                    let snapshot = store.current_snapshot();
                    let listeners = snapshot.listeners(node).expect("node present");
                    let clusters = snapshot.clusters(node).expect("node present");

                    let lds = std::str::from_utf8(&listeners).unwrap();
                    let cds = std::str::from_utf8(&clusters).unwrap();
                    let generation = lds.trim_start_matches("LDS-");
                    assert_eq!(generation, cds.trim_start_matches("CDS-"));
                    assert_eq!(generation, snapshot.version().trim_start_matches('v'));
                    reads.fetch_add(1, Ordering::Relaxed);

                    if done.load(Ordering::Acquire) {
                        break;
                    }
                }
            }));
        }

        for i in 1..=500 {
            store.publish(generation(i));
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            reader.join().expect("Thread panicked");
        }

        assert!(reads.load(Ordering::Relaxed) > 0);
        assert_eq!(store.snapshot().version(), "v500");
    }
}
