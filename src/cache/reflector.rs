//! Drive Indexer
//!
//! Keeps a node-local [`DriveStore`] in step with the cluster by listing the
//! node's drive records, then applying watch events in delivery order. A full
//! re-list runs every `resync_interval` (unless zero) and after any watch
//! failure, so missed events heal without operator action.
//!
//! The indexer counts as synced once the version token of the store has moved
//! off its initial empty value. An empty node still syncs.

use super::store::{DriveStore, StoreReader};
use crate::domain::ports::{DriveListerWatcherRef, NodeId};
use crate::error::{Error, Result};
use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// =============================================================================
// Indexer Configuration
// =============================================================================

/// Configuration for the drive indexer
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Interval between full re-lists. Zero disables periodic re-lists.
    pub resync_interval: Duration,
    /// First retry delay after a failed list or watch
    pub initial_backoff: Duration,
    /// Upper bound of the retry delay
    pub max_backoff: Duration,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            resync_interval: Duration::from_secs(300),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl IndexerConfig {
    /// Reject settings that would retry without pause
    pub fn validate(&self) -> Result<()> {
        if self.initial_backoff.is_zero() {
            return Err(Error::Configuration(
                "initial backoff must be greater than zero".to_string(),
            ));
        }
        if self.max_backoff < self.initial_backoff {
            return Err(Error::Configuration(format!(
                "max backoff {:?} is shorter than initial backoff {:?}",
                self.max_backoff, self.initial_backoff
            )));
        }
        Ok(())
    }

    fn resync_period(&self) -> Option<Duration> {
        if self.resync_interval.is_zero() {
            None
        } else {
            Some(self.resync_interval)
        }
    }
}

/// Why a list+watch cycle ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleEnd {
    Resync,
    Cancelled,
}

// =============================================================================
// Drive Indexer
// =============================================================================

/// Node-scoped, eventually consistent cache of drive records
pub struct DriveIndexer {
    node_id: NodeId,
    config: IndexerConfig,
    source: DriveListerWatcherRef,
    store: Arc<DriveStore>,
    /// Last version token applied to the store; empty until the first list
    version: watch::Sender<String>,
    last_synced_at: RwLock<Option<DateTime<Utc>>>,
}

impl std::fmt::Debug for DriveIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveIndexer")
            .field("node_id", &self.node_id)
            .field("version", &*self.version.borrow())
            .field("entries", &self.store_len())
            .finish()
    }
}

impl DriveIndexer {
    /// Create an indexer. Nothing is fetched until [`DriveIndexer::start`].
    pub fn new(
        node_id: impl Into<NodeId>,
        config: IndexerConfig,
        source: DriveListerWatcherRef,
    ) -> Arc<Self> {
        let (version, _) = watch::channel(String::new());
        Arc::new(Self {
            node_id: node_id.into(),
            config,
            source,
            store: DriveStore::new(),
            version,
            last_synced_at: RwLock::new(None),
        })
    }

    /// Create an indexer, start it and wait for the first sync.
    ///
    /// Never fails: if `cancel` fires first the indexer is returned unsynced
    /// and callers must check [`DriveIndexer::is_synced`] themselves.
    pub async fn open(
        node_id: impl Into<NodeId>,
        config: IndexerConfig,
        source: DriveListerWatcherRef,
        cancel: CancellationToken,
    ) -> Arc<Self> {
        let indexer = Self::new(node_id, config, source);
        indexer.start(cancel.clone());

        if indexer.wait_for_sync(&cancel).await {
            info!(node = %indexer.node_id, "drive indexer synced");
        } else {
            info!(node = %indexer.node_id, "drive indexer could not be synced");
        }

        indexer
    }

    /// Spawn the list+watch task. It runs until `cancel` fires.
    pub fn start(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let indexer = Arc::clone(self);
        tokio::spawn(async move { indexer.run(cancel).await })
    }

    /// Wait until the first sync completes or `cancel` fires.
    ///
    /// Returns whether the indexer is synced.
    pub async fn wait_for_sync(&self, cancel: &CancellationToken) -> bool {
        let mut rx = self.version.subscribe();
        loop {
            if !rx.borrow_and_update().is_empty() {
                return true;
            }
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        return self.is_synced();
                    }
                }
                _ = cancel.cancelled() => return self.is_synced(),
            }
        }
    }

    /// At least one listing has been applied
    pub fn is_synced(&self) -> bool {
        !self.version.borrow().is_empty()
    }

    /// Version token of the last applied listing or event
    pub fn last_sync_version(&self) -> String {
        self.version.borrow().clone()
    }

    /// Time of the last successful listing
    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        *self.last_synced_at.read()
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Read-only handle to the store
    pub fn reader(&self) -> StoreReader {
        StoreReader::new(Arc::clone(&self.store))
    }

    fn store_len(&self) -> usize {
        self.reader().len()
    }

    fn new_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.config.initial_backoff)
            .with_max_interval(self.config.max_backoff)
            .with_max_elapsed_time(None)
            .build()
    }

    fn advance_version(&self, version: &str) {
        if version.is_empty() {
            return;
        }
        self.version.send_if_modified(|current| {
            if current == version {
                false
            } else {
                *current = version.to_string();
                true
            }
        });
    }

    async fn run(&self, cancel: CancellationToken) {
        let mut backoff = self.new_backoff();
        info!(node = %self.node_id, "starting drive indexer");

        loop {
            match self.list_and_watch(&cancel, &mut backoff).await {
                Ok(CycleEnd::Cancelled) => break,
                Ok(CycleEnd::Resync) => backoff.reset(),
                Err(e) => {
                    let delay = backoff.next_backoff().unwrap_or(self.config.max_backoff);
                    warn!(
                        node = %self.node_id,
                        "drive list/watch failed: {}; retrying in {:?}",
                        e,
                        delay
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => break,
                    }
                }
            }
        }

        info!(node = %self.node_id, "drive indexer stopped");
    }

    async fn list_and_watch(
        &self,
        cancel: &CancellationToken,
        backoff: &mut ExponentialBackoff,
    ) -> Result<CycleEnd> {
        let list = tokio::select! {
            list = self.source.list(&self.node_id) => list?,
            _ = cancel.cancelled() => return Ok(CycleEnd::Cancelled),
        };

        debug!(
            node = %self.node_id,
            "listed {} drive records at version {:?}",
            list.items.len(),
            list.version
        );
        self.store.replace(list.items);
        self.advance_version(&list.version);
        *self.last_synced_at.write() = Some(Utc::now());

        // Sleeps far beyond any process lifetime when periodic re-lists are off
        let resync = tokio::time::sleep(self.config.resync_period().unwrap_or(Duration::MAX));
        tokio::pin!(resync);

        loop {
            let version = self.last_sync_version();
            let mut stream = tokio::select! {
                stream = self.source.watch(&self.node_id, &version) => stream?,
                _ = cancel.cancelled() => return Ok(CycleEnd::Cancelled),
                _ = &mut resync => return Ok(CycleEnd::Resync),
            };
            let opened = Instant::now();
            let mut delivered = 0usize;

            loop {
                tokio::select! {
                    event = stream.next() => match event {
                        Some(Ok(event)) => {
                            let version = event.version().map(str::to_string);
                            self.store.apply(event);
                            if let Some(version) = version {
                                self.advance_version(&version);
                            }
                            delivered += 1;
                        }
                        Some(Err(e)) => return Err(e),
                        None => break,
                    },
                    _ = cancel.cancelled() => return Ok(CycleEnd::Cancelled),
                    _ = &mut resync => {
                        debug!(node = %self.node_id, "drive resync interval elapsed");
                        return Ok(CycleEnd::Resync);
                    }
                }
            }

            // A watch closed before it delivered anything or lived long is
            // treated like a failure so that re-watches back off.
            if delivered > 0 || opened.elapsed() >= self.config.max_backoff {
                backoff.reset();
                debug!(node = %self.node_id, "drive watch closed, re-watching from {}", version);
                continue;
            }

            let delay = backoff.next_backoff().unwrap_or(self.config.max_backoff);
            debug!(
                node = %self.node_id,
                "drive watch closed immediately, re-watching in {:?}",
                delay
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Ok(CycleEnd::Cancelled),
                _ = &mut resync => return Ok(CycleEnd::Resync),
            }
        }
    }
}
