//! Endpoint store keyed by cluster name.
//!
//! The store maps a resource name to the pre-serialized endpoint discovery
//! response for that cluster. [`EndpointStore`] uses `DashMap` so readers
//! only contend with the writer on the shard holding their key.

use std::collections::HashMap;

use bytes::Bytes;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::stats::CacheStats;

/// Read side of an endpoint store.
pub trait EndpointSource: Send + Sync {
    /// Serialized response for a resource name, if present.
    fn get_endpoints(&self, name: &str) -> Option<Bytes>;
}

/// A concurrent endpoint store.
///
/// ## Thread Safety
///
/// All operations are thread-safe. Each key is replaced atomically, so a
/// reader sees either the previous or the new bytes for a name. No `DashMap`
/// reference escapes a method: lookups clone the `Bytes` handle and drop the
/// shard guard before returning.
#[derive(Debug)]
pub struct EndpointStore {
    entries: DashMap<String, Bytes>,
    stats: CacheStats,
}

impl Default for EndpointStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Create an empty store with a specific initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
            stats: CacheStats::new(),
        }
    }

    /// Get store statistics.
    #[inline]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Serialized response for a resource name.
    pub fn get(&self, name: &str) -> Option<Bytes> {
        let result = self.entries.get(name).map(|r| r.value().clone());

        self.stats.record_lookup(result.is_some());
        trace!(name = %name, found = result.is_some(), "endpoint lookup");

        result
    }

    /// Insert or replace the response for one resource name.
    pub fn set(&self, name: impl Into<String>, response: impl Into<Bytes>) {
        let name = name.into();
        let response = response.into();

        debug!(name = %name, bytes = response.len(), "set endpoints");
        self.entries.insert(name, response);
        self.stats.record_publish();
    }

    /// Remove a resource name, e.g. after the cluster was decommissioned.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.entries.remove(name).is_some();
        if removed {
            debug!(name = %name, "removed endpoints");
        }
        removed
    }

    /// Replace the whole content of the store with a new generation.
    ///
    /// Every name in `generation` is replaced atomically; names absent from it
    /// are removed afterwards.
    pub fn replace_all(&self, generation: HashMap<String, Bytes>) {
        let count = generation.len();

        for (name, response) in &generation {
            self.entries.insert(name.clone(), response.clone());
        }
        self.entries.retain(|name, _| generation.contains_key(name));
        self.stats.record_publish();

        debug!(entries = count, "replaced endpoint generation");
    }

    /// Check if a resource name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of resource names in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All resource names currently present.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|r| r.key().clone()).collect()
    }
}

impl EndpointSource for EndpointStore {
    fn get_endpoints(&self, name: &str) -> Option<Bytes> {
        self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn store_basic_operations() {
        let store = EndpointStore::new();

        assert!(store.get("svc-a").is_none());
        assert!(store.is_empty());

        store.set("svc-a", Bytes::from_static(b"ENDPOINTS_A"));
        assert!(store.contains("svc-a"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("svc-a").unwrap(), Bytes::from_static(b"ENDPOINTS_A"));

        assert!(store.remove("svc-a"));
        assert!(!store.remove("svc-a"));
        assert!(store.get("svc-a").is_none());
    }

    #[test]
    fn store_stats_tracking() {
        let store = EndpointStore::new();

        store.get("svc-a");
        assert_eq!(store.stats().misses(), 1);

        store.set("svc-a", "x");
        assert_eq!(store.stats().publishes(), 1);

        store.get("svc-a");
        assert_eq!(store.stats().hits(), 1);
    }

    #[test]
    fn replace_all_drops_stale_names() {
        let store = EndpointStore::new();
        store.set("svc-a", "A1");
        store.set("svc-b", "B1");

        let mut generation = HashMap::new();
        generation.insert("svc-b".to_string(), Bytes::from_static(b"B2"));
        generation.insert("svc-c".to_string(), Bytes::from_static(b"C2"));
        store.replace_all(generation);

        assert!(store.get("svc-a").is_none());
        assert_eq!(store.get("svc-b").unwrap(), "B2");
        assert_eq!(store.get("svc-c").unwrap(), "C2");

        let mut names = store.names();
        names.sort();
        assert_eq!(names, vec!["svc-b", "svc-c"]);
    }

    #[test]
    fn source_trait_reads_store() {
        let store = EndpointStore::new();
        store.set("svc-a", "A");
        let source: &dyn EndpointSource = &store;
        assert_eq!(source.get_endpoints("svc-a").unwrap(), "A");
        assert!(source.get_endpoints("svc-b").is_none());
    }

    #[test]
    fn concurrent_reads_during_updates() {
        let store = Arc::new(EndpointStore::new());
        store.set("svc-a", "gen-0");

        let reads = Arc::new(AtomicUsize::new(0));
        let mut handles = vec![];

        {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for i in 1..=200 {
                    store.set("svc-a", format!("gen-{i}"));
                }
            }));
        }

        for _ in 0..5 {
            let store = Arc::clone(&store);
            let reads = Arc::clone(&reads);
            handles.push(thread::spawn(move || {
                for _ in 0..200 {
                    let bytes = store.get("svc-a").expect("key always present");
                    assert!(bytes.starts_with(b"gen-"));
                    reads.fetch_add(1, Ordering::Relaxed);
                }
            }));
        }

        for handle in handles {
            handle.join().expect("Thread panicked");
        }

        assert_eq!(reads.load(Ordering::Relaxed), 1000);
        assert_eq!(store.get("svc-a").unwrap(), "gen-200");
    }
}
