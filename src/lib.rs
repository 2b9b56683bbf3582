//! Drive Reconciler - Node-Local Drive Cache and Device Validation
//!
//! Keeps a node-scoped view of the cluster's ManagedDrive records and decides
//! whether a block device reported by the kernel still matches the record the
//! cluster holds for it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                           Node Drive Reconciler                             │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────────┐  │
//! │  │   Kubernetes    │  │  Drive Indexer  │  │        Drive Store          │  │
//! │  │   list/watch    │─►│ resync, backoff │─►│   (RwLock<HashMap>)         │  │
//! │  └─────────────────┘  └─────────────────┘  └─────────────┬───────────────┘  │
//! │                                                          │                  │
//! │                                               ┌──────────┴──────────┐       │
//! │                                               │   Drive Selector    │       │
//! │                                               │ managed/non-managed │       │
//! │                                               └──────────┬──────────┘       │
//! ├──────────────────────────────────────────────────────────┼──────────────────┤
//! │                        Device Validation                 │                  │
//! │  ┌─────────────────┐  ┌─────────────────────────────────┴───────────────┐  │
//! │  │  Path Resolver  │─►│  mount │ udev │ system │ dev-info field tables   │  │
//! │  └─────────────────┘  └─────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: Node-scoped list/watch cache of drive records
//! - [`hardware`]: Device descriptors, path resolution, validation and selection
//! - [`crd`]: Custom Resource Definitions
//! - [`domain`]: Core domain types and traits
//! - [`error`]: Error types and handling

pub mod cache;
pub mod crd;
pub mod domain;
pub mod error;
pub mod hardware;

// Re-export commonly used types
pub use cache::{DriveIndexer, IndexerConfig, KubeDriveSource, StoreReader};

pub use crd::{DriveStatus, ManagedDrive, ManagedDriveSpec, ManagedDriveStatus, RequestedFormat};

pub use domain::ports::{
    DriveList, DriveListerWatcher, DriveListerWatcherRef, DriveWatchEvent, NodeId,
};

pub use error::{Error, ErrorAction, Result};

pub use hardware::{
    device_names, is_format_requested, resolve_root_block_path, validate_dev_info,
    validate_mount_info, validate_sys_info, validate_udev_info, Device, DriveSelector,
    PartitionedDrives, PathConfig, Validation,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
