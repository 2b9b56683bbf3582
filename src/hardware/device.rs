//! Device Descriptor
//!
//! The kernel's current view of one block device, assembled by the uevent
//! source from sysfs and the udev database. Built fresh per event and never
//! modified afterwards.

use serde::{Deserialize, Serialize};

/// Block device as reported by the kernel and udev
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Kernel name (e.g. sdb1)
    pub name: String,
    /// Canonical host path (e.g. /dev/sdb1)
    pub path: String,
    pub major: u32,
    pub minor: u32,
    /// Partition number, 0 for whole disks
    pub partition: u32,

    /// Primary mount point, empty if unmounted
    pub first_mount_point: String,
    /// Options of the primary mount
    pub first_mount_options: Vec<String>,

    /// Size in bytes
    pub size: u64,
    pub read_only: bool,
    pub partitioned: bool,
    pub removable: bool,
    pub hidden: bool,
    /// Number of holders stacked on this device
    pub holders: u32,

    /// Probed filesystem type
    pub fs_type: String,
    /// Probed filesystem UUID
    pub fs_uuid: String,
    /// ID_FS_UUID from the udev database
    pub uevent_fs_uuid: String,

    pub wwid: String,
    pub model: String,
    /// ID_SERIAL_SHORT
    pub uevent_serial: String,
    /// ID_SERIAL
    pub serial_long: String,
    pub vendor: String,
    pub dm_name: String,
    pub dm_uuid: String,
    pub md_uuid: String,
    pub pt_uuid: String,
    pub pt_type: String,
    pub part_uuid: String,
    pub pci_path: String,

    pub swap_on: bool,
}

impl Device {
    /// Location of the udev database entry for this device
    pub fn udev_data_path(&self) -> String {
        format!("/run/udev/data/b{}:{}", self.major, self.minor)
    }
}

/// Comma separated device names, for log messages
pub fn device_names(devices: &[Device]) -> String {
    devices
        .iter()
        .map(|d| d.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Device {
        Device {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_device_names() {
        assert_eq!(device_names(&[]), "");
        assert_eq!(device_names(&[named("sda")]), "sda");
        assert_eq!(
            device_names(&[named("sda"), named("sdb1"), named("nvme0n1")]),
            "sda, sdb1, nvme0n1"
        );
    }

    #[test]
    fn test_udev_data_path() {
        let device = Device {
            major: 8,
            minor: 17,
            ..Default::default()
        };
        assert_eq!(device.udev_data_path(), "/run/udev/data/b8:17");
    }
}
