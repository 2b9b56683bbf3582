//! Field Tables
//!
//! Each comparison dimension is a list of [`FieldCheck`]s: a field name, how
//! to read the value from the drive record and from the device, and the
//! policy deciding equality. Adding or retiring a field is an edit to a table.

use crate::crd::ManagedDriveStatus;
use crate::hardware::device::Device;

// =============================================================================
// Field Values
// =============================================================================

/// Borrowed value of a compared field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Str(&'a str),
    Num(u64),
    Flag(bool),
}

impl FieldValue<'_> {
    /// Empty string. Numbers and flags are never empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Str(s) if s.is_empty())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(*s),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Str(s) => write!(f, "{:?}", s),
            FieldValue::Num(n) => write!(f, "{}", n),
            FieldValue::Flag(b) => write!(f, "{}", b),
        }
    }
}

// =============================================================================
// Match Policy
// =============================================================================

/// How a record value is compared with the observed device value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Values must be equal
    Strict,
    /// Values must be equal unless the device reports nothing. Used for udev
    /// properties that are filled in late or never for some filesystems.
    TolerateEmptyObserved,
    /// Equal, or equal after dropping the record's `<ext>.` prefix and the
    /// device's `0x` prefix
    Wwid,
}

/// Result of evaluating one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    Equal,
    /// Device value was empty and the policy accepted it
    Tolerated,
    Mismatch { expected: String, observed: String },
}

pub type RecordField = for<'a> fn(&'a ManagedDriveStatus) -> FieldValue<'a>;
pub type DeviceField = for<'a> fn(&'a Device) -> FieldValue<'a>;

/// One row of a comparison table
#[derive(Clone, Copy)]
pub struct FieldCheck {
    pub field: &'static str,
    pub record: RecordField,
    pub device: DeviceField,
    pub policy: MatchPolicy,
}

impl std::fmt::Debug for FieldCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCheck")
            .field("field", &self.field)
            .field("policy", &self.policy)
            .finish()
    }
}

impl FieldCheck {
    /// Compare the record's value of this field with the device's
    pub fn evaluate(&self, status: &ManagedDriveStatus, device: &Device) -> FieldOutcome {
        let expected = (self.record)(status);
        let observed = (self.device)(device);

        let equal = match self.policy {
            MatchPolicy::Strict | MatchPolicy::TolerateEmptyObserved => expected == observed,
            MatchPolicy::Wwid => match (expected.as_str(), observed.as_str()) {
                (Some(record), Some(device)) => wwid_equal(record, device),
                _ => expected == observed,
            },
        };

        if equal {
            FieldOutcome::Equal
        } else if self.policy == MatchPolicy::TolerateEmptyObserved && observed.is_empty() {
            FieldOutcome::Tolerated
        } else {
            FieldOutcome::Mismatch {
                expected: expected.to_string(),
                observed: observed.to_string(),
            }
        }
    }
}

/// Strip the naming-authority extension (`naa.`, `eui.`, ...) from a WWID
pub fn wwid_without_extension(wwid: &str) -> &str {
    match wwid.split_once('.') {
        Some((_, rest)) => rest,
        None => wwid,
    }
}

fn wwid_equal(record: &str, device: &str) -> bool {
    record == device
        || wwid_without_extension(record) == device.strip_prefix("0x").unwrap_or(device)
}

// =============================================================================
// Tables
// =============================================================================

/// Hardware and udev identity, evaluated in order
pub static UDEV_FIELDS: [FieldCheck; 18] = [
    FieldCheck {
        field: "path",
        record: |s| FieldValue::Str(&s.path),
        device: |d| FieldValue::Str(&d.path),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "majorNumber",
        record: |s| FieldValue::Num(s.major_number as u64),
        device: |d| FieldValue::Num(d.major as u64),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "minorNumber",
        record: |s| FieldValue::Num(s.minor_number as u64),
        device: |d| FieldValue::Num(d.minor as u64),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "partitionNum",
        record: |s| FieldValue::Num(s.partition_num as u64),
        device: |d| FieldValue::Num(d.partition as u64),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "wwid",
        record: |s| FieldValue::Str(&s.wwid),
        device: |d| FieldValue::Str(&d.wwid),
        policy: MatchPolicy::Wwid,
    },
    FieldCheck {
        field: "modelNumber",
        record: |s| FieldValue::Str(&s.model_number),
        device: |d| FieldValue::Str(&d.model),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "ueventSerial",
        record: |s| FieldValue::Str(&s.uevent_serial),
        device: |d| FieldValue::Str(&d.uevent_serial),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "serialNumberLong",
        record: |s| FieldValue::Str(&s.serial_number_long),
        device: |d| FieldValue::Str(&d.serial_long),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "vendor",
        record: |s| FieldValue::Str(&s.vendor),
        device: |d| FieldValue::Str(&d.vendor),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "dmName",
        record: |s| FieldValue::Str(&s.dm_name),
        device: |d| FieldValue::Str(&d.dm_name),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "dmUUID",
        record: |s| FieldValue::Str(&s.dm_uuid),
        device: |d| FieldValue::Str(&d.dm_uuid),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "mdUUID",
        record: |s| FieldValue::Str(&s.md_uuid),
        device: |d| FieldValue::Str(&d.md_uuid),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "partTableUUID",
        record: |s| FieldValue::Str(&s.part_table_uuid),
        device: |d| FieldValue::Str(&d.pt_uuid),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "partTableType",
        record: |s| FieldValue::Str(&s.part_table_type),
        device: |d| FieldValue::Str(&d.pt_type),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "partitionUUID",
        record: |s| FieldValue::Str(&s.partition_uuid),
        device: |d| FieldValue::Str(&d.part_uuid),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "filesystem",
        record: |s| FieldValue::Str(&s.filesystem),
        device: |d| FieldValue::Str(&d.fs_type),
        policy: MatchPolicy::TolerateEmptyObserved,
    },
    FieldCheck {
        field: "ueventFSUUID",
        record: |s| FieldValue::Str(&s.uevent_fs_uuid),
        device: |d| FieldValue::Str(&d.uevent_fs_uuid),
        policy: MatchPolicy::TolerateEmptyObserved,
    },
    FieldCheck {
        field: "pciPath",
        record: |s| FieldValue::Str(&s.pci_path),
        device: |d| FieldValue::Str(&d.pci_path),
        policy: MatchPolicy::Strict,
    },
];

/// System-level block attributes
// TODO: enforce removable, hidden and holders.
pub static SYSTEM_FIELDS: [FieldCheck; 3] = [
    FieldCheck {
        field: "readOnly",
        record: |s| FieldValue::Flag(s.read_only),
        device: |d| FieldValue::Flag(d.read_only),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "totalCapacity",
        record: |s| FieldValue::Num(s.total_capacity),
        device: |d| FieldValue::Num(d.size),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "partitioned",
        record: |s| FieldValue::Flag(s.partitioned),
        device: |d| FieldValue::Flag(d.partitioned),
        policy: MatchPolicy::Strict,
    },
];

/// Probed filesystem identity and swap state
pub static DEV_INFO_FIELDS: [FieldCheck; 2] = [
    FieldCheck {
        field: "filesystemUUID",
        record: |s| FieldValue::Str(&s.filesystem_uuid),
        device: |d| FieldValue::Str(&d.fs_uuid),
        policy: MatchPolicy::Strict,
    },
    FieldCheck {
        field: "swapOn",
        record: |s| FieldValue::Flag(s.swap_on),
        device: |d| FieldValue::Flag(d.swap_on),
        policy: MatchPolicy::Strict,
    },
];
