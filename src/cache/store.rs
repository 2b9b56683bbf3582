//! Drive Store
//!
//! Keyed in-memory store of drive records fed by the indexer. The indexer task
//! is the only writer; everything else reads through a [`StoreReader`].

use crate::domain::ports::DriveWatchEvent;
use kube::api::DynamicObject;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Store key of an object: `namespace/name`, or `name` when cluster scoped
pub fn object_key(obj: &DynamicObject) -> String {
    let name = obj.metadata.name.as_deref().unwrap_or_default();
    match obj.metadata.namespace.as_deref() {
        Some(ns) if !ns.is_empty() => format!("{}/{}", ns, name),
        _ => name.to_string(),
    }
}

// =============================================================================
// Store Statistics
// =============================================================================

/// Counters of changes applied to the store
#[derive(Debug, Default)]
pub struct StoreStats {
    pub relists: AtomicU64,
    pub added: AtomicU64,
    pub modified: AtomicU64,
    pub deleted: AtomicU64,
}

impl StoreStats {
    /// Create a snapshot of current stats
    pub fn snapshot(&self) -> StoreStatsSnapshot {
        StoreStatsSnapshot {
            relists: self.relists.load(Ordering::Relaxed),
            added: self.added.load(Ordering::Relaxed),
            modified: self.modified.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of store statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStatsSnapshot {
    pub relists: u64,
    pub added: u64,
    pub modified: u64,
    pub deleted: u64,
}

// =============================================================================
// Drive Store
// =============================================================================

/// Concurrent map of cached drive objects
#[derive(Debug, Default)]
pub struct DriveStore {
    entries: RwLock<HashMap<String, Arc<DynamicObject>>>,
    stats: StoreStats,
}

impl DriveStore {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Swap the whole content for a fresh listing
    pub(crate) fn replace(&self, items: Vec<DynamicObject>) {
        let fresh: HashMap<_, _> = items
            .into_iter()
            .map(|obj| (object_key(&obj), Arc::new(obj)))
            .collect();
        *self.entries.write() = fresh;
        self.stats.relists.fetch_add(1, Ordering::Relaxed);
    }

    /// Apply one watch event
    pub(crate) fn apply(&self, event: DriveWatchEvent) {
        match event {
            DriveWatchEvent::Added(obj) => {
                self.entries.write().insert(object_key(&obj), Arc::new(obj));
                self.stats.added.fetch_add(1, Ordering::Relaxed);
            }
            DriveWatchEvent::Modified(obj) => {
                self.entries.write().insert(object_key(&obj), Arc::new(obj));
                self.stats.modified.fetch_add(1, Ordering::Relaxed);
            }
            DriveWatchEvent::Deleted(obj) => {
                self.entries.write().remove(&object_key(&obj));
                self.stats.deleted.fetch_add(1, Ordering::Relaxed);
            }
            DriveWatchEvent::Bookmark(_) => {}
        }
    }

    fn list(&self) -> Vec<Arc<DynamicObject>> {
        self.entries.read().values().cloned().collect()
    }

    fn get(&self, key: &str) -> Option<Arc<DynamicObject>> {
        self.entries.read().get(key).cloned()
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

// =============================================================================
// Store Reader
// =============================================================================

/// Read-only handle to a [`DriveStore`]
#[derive(Debug, Clone)]
pub struct StoreReader {
    store: Arc<DriveStore>,
}

impl StoreReader {
    pub(crate) fn new(store: Arc<DriveStore>) -> Self {
        Self { store }
    }

    /// Snapshot of every cached object
    pub fn list(&self) -> Vec<Arc<DynamicObject>> {
        self.store.list()
    }

    /// Cached object by store key
    pub fn get(&self, key: &str) -> Option<Arc<DynamicObject>> {
        self.store.get(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Changes applied so far
    pub fn stats(&self) -> StoreStatsSnapshot {
        self.store.stats.snapshot()
    }
}
