//! Node-Local Drive Cache
//!
//! A read-through view of the cluster's ManagedDrive records for one node,
//! kept current by list+watch so lookups never go to the API server.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   list / watch    ┌──────────────────────┐
//! │  DriveListerWatcher  │ ────────────────► │     DriveIndexer     │
//! │  (KubeDriveSource)   │   node-scoped     │  resync + backoff    │
//! └──────────────────────┘                   └──────────┬───────────┘
//!                                                       │ replace / apply
//!                                            ┌──────────▼───────────┐
//!                                            │      DriveStore      │
//!                                            │ key -> DynamicObject │
//!                                            └──────────┬───────────┘
//!                                                       │ StoreReader
//!                                            ┌──────────▼───────────┐
//!                                            │    DriveSelector     │
//!                                            └──────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use drive_reconciler::cache::{DriveIndexer, IndexerConfig, KubeDriveSource};
//!
//! let source = Arc::new(KubeDriveSource::new(client));
//! let indexer = DriveIndexer::open("worker-1", IndexerConfig::default(), source, cancel).await;
//! if indexer.is_synced() {
//!     println!("{} drive records cached", indexer.reader().len());
//! }
//! ```

pub mod kube_source;
pub mod reflector;
pub mod store;

pub use kube_source::{node_selector, KubeDriveSource};
pub use reflector::{DriveIndexer, IndexerConfig};
pub use store::{object_key, DriveStore, StoreReader, StoreStatsSnapshot};
