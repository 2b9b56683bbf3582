//! Custom Resource Definitions
//!
//! - ManagedDrive: the cluster's record of a block device on a node

pub mod managed_drive;

pub use managed_drive::*;
