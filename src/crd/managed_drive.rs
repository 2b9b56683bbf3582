//! ManagedDrive CRD
//!
//! The cluster's record of one physical or logical drive on a node. The node
//! agent writes the status from the kernel's view of the device; the uevent
//! path reads it back through the drive indexer and compares it with what the
//! kernel reports now.

use crate::error::{Error, Result};
use kube::api::DynamicObject;
use kube::{CustomResource, Resource};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Label carrying the node a drive record belongs to. Used to scope list/watch.
pub const NODE_LABEL: &str = "storage.billyronks.io/node";

// =============================================================================
// ManagedDrive CRD
// =============================================================================

/// ManagedDrive is the orchestrator's claim about a block device on a node.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "storage.billyronks.io",
    version = "v1",
    kind = "ManagedDrive",
    plural = "manageddrives",
    shortname = "md",
    status = "ManagedDriveStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name": "Node", "type": "string", "jsonPath": ".status.nodeName"}"#,
    printcolumn = r#"{"name": "Path", "type": "string", "jsonPath": ".status.path"}"#,
    printcolumn = r#"{"name": "Capacity", "type": "integer", "jsonPath": ".status.totalCapacity"}"#,
    printcolumn = r#"{"name": "Status", "type": "string", "jsonPath": ".status.driveStatus"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#,
    namespaced = false
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDriveSpec {
    /// Drive is owned by the orchestrator
    #[serde(default)]
    pub owned: bool,

    /// Pending format request, cleared once the node agent acts on it
    #[serde(default)]
    pub requested_format: Option<RequestedFormat>,
}

// =============================================================================
// Sub-Types
// =============================================================================

/// Format request placed on a drive by an administrator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestedFormat {
    /// Filesystem to create
    #[serde(default = "default_filesystem")]
    pub filesystem: String,

    /// Overwrite an existing filesystem
    #[serde(default)]
    pub force: bool,

    /// Wipe partition tables before formatting
    #[serde(default)]
    pub purge: bool,
}

/// Lifecycle state of a drive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum DriveStatus {
    #[default]
    Available,
    Unavailable,
    InUse,
    Ready,
    Released,
    Terminating,
    Error,
}

impl DriveStatus {
    /// Drive is actively used or prepared for use
    pub fn is_managed(&self) -> bool {
        matches!(self, DriveStatus::InUse | DriveStatus::Ready)
    }
}

impl std::fmt::Display for DriveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriveStatus::Available => write!(f, "Available"),
            DriveStatus::Unavailable => write!(f, "Unavailable"),
            DriveStatus::InUse => write!(f, "InUse"),
            DriveStatus::Ready => write!(f, "Ready"),
            DriveStatus::Released => write!(f, "Released"),
            DriveStatus::Terminating => write!(f, "Terminating"),
            DriveStatus::Error => write!(f, "Error"),
        }
    }
}

// =============================================================================
// Status
// =============================================================================

/// Observed state of the drive as last recorded by the node agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDriveStatus {
    /// Node the drive is attached to
    #[serde(default)]
    pub node_name: String,

    /// Host block device path (e.g. /dev/sdb1)
    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub major_number: u32,

    #[serde(default)]
    pub minor_number: u32,

    /// Partition number, 0 for whole disks
    #[serde(default)]
    pub partition_num: u32,

    /// Primary mount point
    #[serde(default)]
    pub mountpoint: String,

    /// Options of the primary mount; order carries no meaning
    #[serde(default)]
    pub mount_options: Vec<String>,

    /// Total capacity in bytes
    #[serde(default)]
    pub total_capacity: u64,

    #[serde(default)]
    pub read_only: bool,

    #[serde(default)]
    pub partitioned: bool,

    #[serde(default)]
    pub removable: bool,

    #[serde(default)]
    pub hidden: bool,

    /// Number of holders (device-mapper, md) stacked on this device
    #[serde(default)]
    pub holders: u32,

    /// Filesystem type
    #[serde(default)]
    pub filesystem: String,

    /// Filesystem UUID as read from the superblock
    #[serde(default)]
    pub filesystem_uuid: String,

    /// Filesystem UUID as reported by udev (ID_FS_UUID)
    #[serde(default)]
    pub uevent_fs_uuid: String,

    #[serde(default)]
    pub vendor: String,

    #[serde(default)]
    pub model_number: String,

    /// Short serial as reported by udev (ID_SERIAL_SHORT)
    #[serde(default)]
    pub uevent_serial: String,

    #[serde(default)]
    pub serial_number_long: String,

    #[serde(default)]
    pub wwid: String,

    #[serde(default)]
    pub dm_name: String,

    #[serde(default)]
    pub dm_uuid: String,

    /// Software RAID UUID
    #[serde(default)]
    pub md_uuid: String,

    #[serde(default)]
    pub part_table_uuid: String,

    #[serde(default)]
    pub part_table_type: String,

    #[serde(default)]
    pub partition_uuid: String,

    #[serde(default)]
    pub pci_path: String,

    #[serde(default)]
    pub swap_on: bool,

    #[serde(default)]
    pub drive_status: DriveStatus,
}

fn default_filesystem() -> String {
    "xfs".to_string()
}

// =============================================================================
// Implementations
// =============================================================================

impl ManagedDrive {
    /// Observed status, or an empty status if the agent never wrote one
    pub fn observed(&self) -> Cow<'_, ManagedDriveStatus> {
        match &self.status {
            Some(status) => Cow::Borrowed(status),
            None => Cow::Owned(ManagedDriveStatus::default()),
        }
    }

    /// Node the drive belongs to
    pub fn node_name(&self) -> &str {
        self.status.as_ref().map(|s| s.node_name.as_str()).unwrap_or_default()
    }

    /// Current lifecycle state
    pub fn drive_status(&self) -> DriveStatus {
        self.status.as_ref().map(|s| s.drive_status).unwrap_or_default()
    }

    /// Drive is in use or ready for use
    pub fn is_managed(&self) -> bool {
        self.drive_status().is_managed()
    }

    /// Convert into the untyped form held by the drive store
    pub fn to_dynamic(&self) -> Result<DynamicObject> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Typed view of a cached object.
    ///
    /// Fails with [`Error::TypeMismatch`] if the object's `apiVersion`/`kind`
    /// do not name a ManagedDrive, or if its body does not decode as one.
    pub fn try_from_dynamic(obj: &DynamicObject) -> Result<Self> {
        let key = crate::cache::object_key(obj);
        let expected_kind = ManagedDrive::kind(&());
        let expected_version = ManagedDrive::api_version(&());

        match &obj.types {
            Some(types) if types.kind == expected_kind && types.api_version == expected_version => {}
            Some(types) => {
                return Err(Error::TypeMismatch {
                    key,
                    reason: format!("found {}/{}", types.api_version, types.kind),
                })
            }
            None => {
                return Err(Error::TypeMismatch {
                    key,
                    reason: "object carries no type information".to_string(),
                })
            }
        }

        let value = serde_json::to_value(obj)?;
        serde_json::from_value(value).map_err(|e| Error::TypeMismatch {
            key,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use kube::ResourceExt;

    fn make_drive(status: DriveStatus) -> ManagedDrive {
        let mut drive = ManagedDrive::new("drive-sdb", ManagedDriveSpec::default());
        drive.status = Some(ManagedDriveStatus {
            node_name: "node-1".into(),
            path: "/dev/sdb".into(),
            drive_status: status,
            ..Default::default()
        });
        drive
    }

    #[test]
    fn test_drive_status_is_managed() {
        assert!(DriveStatus::InUse.is_managed());
        assert!(DriveStatus::Ready.is_managed());
        assert!(!DriveStatus::Available.is_managed());
        assert!(!DriveStatus::Released.is_managed());
        assert!(!DriveStatus::Terminating.is_managed());
        assert!(!DriveStatus::Error.is_managed());
    }

    #[test]
    fn test_observed_without_status() {
        let drive = ManagedDrive::new("drive-sdc", ManagedDriveSpec::default());
        assert_eq!(drive.observed().path, "");
        assert_eq!(drive.node_name(), "");
        assert_eq!(drive.drive_status(), DriveStatus::Available);
    }

    #[test]
    fn test_dynamic_conversion() {
        let drive = make_drive(DriveStatus::Ready);
        let obj = drive.to_dynamic().unwrap();

        let types = obj.types.clone().unwrap();
        assert_eq!(types.kind, "ManagedDrive");
        assert_eq!(types.api_version, "storage.billyronks.io/v1");

        let parsed = ManagedDrive::try_from_dynamic(&obj).unwrap();
        assert_eq!(parsed.name_any(), "drive-sdb");
        assert_eq!(parsed.status, drive.status);
    }

    #[test]
    fn test_foreign_object_is_type_mismatch() {
        let mut obj = make_drive(DriveStatus::Ready).to_dynamic().unwrap();
        if let Some(types) = obj.types.as_mut() {
            types.kind = "StorageNode".into();
        }

        let err = ManagedDrive::try_from_dynamic(&obj).unwrap_err();
        assert_matches!(err, Error::TypeMismatch { .. });
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_untyped_object_is_type_mismatch() {
        let mut obj = make_drive(DriveStatus::Ready).to_dynamic().unwrap();
        obj.types = None;

        assert_matches!(
            ManagedDrive::try_from_dynamic(&obj),
            Err(Error::TypeMismatch { .. })
        );
    }
}
