//! Device Validator
//!
//! Decides whether a cached drive record still describes a block device.
//! Each dimension is a separate predicate so callers only pay for the checks
//! their decision depends on.

use super::fields::{FieldCheck, FieldOutcome, DEV_INFO_FIELDS, SYSTEM_FIELDS, UDEV_FIELDS};
use crate::crd::{DriveStatus, ManagedDrive, ManagedDriveStatus};
use crate::hardware::device::Device;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

// =============================================================================
// Validation Result
// =============================================================================

/// Dimension a validation covered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Mount,
    UDev,
    System,
    DevInfo,
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Mount => write!(f, "mount"),
            Dimension::UDev => write!(f, "udev"),
            Dimension::System => write!(f, "system"),
            Dimension::DevInfo => write!(f, "devinfo"),
        }
    }
}

/// A field whose recorded value differs from the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMismatch {
    pub field: String,
    /// Value in the drive record
    pub expected: String,
    /// Value reported by the kernel
    pub observed: String,
}

/// A field the device reported empty and that was accepted anyway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToleratedField {
    pub field: String,
    /// Value in the drive record
    pub expected: String,
}

/// Outcome of one validation predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub dimension: Dimension,
    /// First mismatching field; later fields are not evaluated
    pub mismatch: Option<FieldMismatch>,
    pub tolerated: Vec<ToleratedField>,
}

impl Validation {
    fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            mismatch: None,
            tolerated: Vec::new(),
        }
    }

    /// Record matches the device in this dimension
    pub fn is_match(&self) -> bool {
        self.mismatch.is_none()
    }

    /// Name of the mismatching field, if any
    pub fn mismatched_field(&self) -> Option<&str> {
        self.mismatch.as_ref().map(|m| m.field.as_str())
    }
}

// =============================================================================
// Predicates
// =============================================================================

/// Check the primary mount point and its options (compared as a set)
pub fn validate_mount_info(device: &Device, drive: &ManagedDrive) -> Validation {
    let status = drive.observed();
    let mut validation = Validation::new(Dimension::Mount);

    if device.first_mount_point != status.mountpoint {
        validation.mismatch = Some(mismatch(
            device,
            "mountpoint",
            format!("{:?}", status.mountpoint),
            format!("{:?}", device.first_mount_point),
        ));
        return validation;
    }

    let recorded: BTreeSet<&str> = status.mount_options.iter().map(String::as_str).collect();
    let observed: BTreeSet<&str> = device.first_mount_options.iter().map(String::as_str).collect();
    if recorded != observed {
        validation.mismatch = Some(mismatch(
            device,
            "mountOptions",
            format!("{:?}", recorded),
            format!("{:?}", observed),
        ));
    }

    validation
}

/// Check hardware and udev identity
pub fn validate_udev_info(device: &Device, drive: &ManagedDrive) -> Validation {
    run_checks(Dimension::UDev, &UDEV_FIELDS, device, drive)
}

/// Check read-only flag, capacity and partitioning
pub fn validate_sys_info(device: &Device, drive: &ManagedDrive) -> Validation {
    run_checks(Dimension::System, &SYSTEM_FIELDS, device, drive)
}

/// Check the probed filesystem UUID and swap state.
///
/// Unlike [`validate_udev_info`], an empty UUID on the device is a mismatch.
pub fn validate_dev_info(device: &Device, drive: &ManagedDrive) -> Validation {
    run_checks(Dimension::DevInfo, &DEV_INFO_FIELDS, device, drive)
}

/// Owned, available drive with a pending format request
pub fn is_format_requested(drive: &ManagedDrive) -> bool {
    drive.spec.owned
        && drive.spec.requested_format.is_some()
        && drive.drive_status() == DriveStatus::Available
}

fn run_checks(
    dimension: Dimension,
    checks: &[FieldCheck],
    device: &Device,
    drive: &ManagedDrive,
) -> Validation {
    let observed = drive.observed();
    let status: &ManagedDriveStatus = &observed;
    let mut validation = Validation::new(dimension);

    for check in checks {
        match check.evaluate(status, device) {
            FieldOutcome::Equal => {}
            FieldOutcome::Tolerated => {
                let expected = (check.record)(status).to_string();
                warn!(
                    device = %device.name,
                    field = check.field,
                    expected = %expected,
                    "{} not found in {}; keeping recorded value",
                    check.field,
                    device.udev_data_path()
                );
                validation.tolerated.push(ToleratedField {
                    field: check.field.to_string(),
                    expected,
                });
            }
            FieldOutcome::Mismatch { expected, observed } => {
                validation.mismatch = Some(mismatch(device, check.field, expected, observed));
                return validation;
            }
        }
    }

    validation
}

fn mismatch(device: &Device, field: &str, expected: String, observed: String) -> FieldMismatch {
    debug!(
        device = %device.name,
        field,
        expected = %expected,
        observed = %observed,
        "drive field mismatch"
    );
    FieldMismatch {
        field: field.to_string(),
        expected,
        observed,
    }
}
