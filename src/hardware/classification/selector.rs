//! Drive Selector
//!
//! Queries the node-local drive cache. Every cached object is read through the
//! typed [`ManagedDrive`] view; an object that is not a drive record aborts the
//! query with [`Error::TypeMismatch`](crate::error::Error::TypeMismatch).

use crate::cache::StoreReader;
use crate::crd::ManagedDrive;
use crate::domain::ports::NodeId;
use crate::error::Result;
use tracing::debug;

/// Node-local drives split by management state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionedDrives {
    /// Drives in InUse or Ready state
    pub managed: Vec<ManagedDrive>,
    /// Every other node-local drive
    pub non_managed: Vec<ManagedDrive>,
}

impl PartitionedDrives {
    pub fn total(&self) -> usize {
        self.managed.len() + self.non_managed.len()
    }
}

/// Looks up drive records belonging to one node
#[derive(Debug, Clone)]
pub struct DriveSelector {
    node_id: NodeId,
    reader: StoreReader,
}

impl DriveSelector {
    pub fn new(node_id: impl Into<NodeId>, reader: StoreReader) -> Self {
        Self {
            node_id: node_id.into(),
            reader,
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Typed snapshot of this node's drives, ordered by path
    fn node_drives(&self) -> Result<Vec<ManagedDrive>> {
        let mut drives = Vec::new();
        for obj in self.reader.list() {
            let drive = ManagedDrive::try_from_dynamic(&obj)?;
            if drive.node_name() == self.node_id.as_str() {
                drives.push(drive);
            }
        }
        drives.sort_by(|a, b| a.observed().path.cmp(&b.observed().path));
        Ok(drives)
    }

    /// Drives whose udev filesystem UUID equals `uuid`
    pub fn filter_by_uevent_fs_uuid(&self, uuid: &str) -> Result<Vec<ManagedDrive>> {
        let drives: Vec<_> = self
            .node_drives()?
            .into_iter()
            .filter(|drive| drive.observed().uevent_fs_uuid == uuid)
            .collect();

        debug!(
            node = %self.node_id,
            "{} drive(s) with uevent fs uuid {:?}",
            drives.len(),
            uuid
        );
        Ok(drives)
    }

    /// All drives of this node, split into managed and non-managed
    pub fn list_drives(&self) -> Result<PartitionedDrives> {
        let (managed, non_managed) = self
            .node_drives()?
            .into_iter()
            .partition(ManagedDrive::is_managed);

        Ok(PartitionedDrives {
            managed,
            non_managed,
        })
    }

    /// The drive recorded at `path`, if any
    pub fn find_by_path(&self, path: &str) -> Result<Option<ManagedDrive>> {
        Ok(self
            .node_drives()?
            .into_iter()
            .find(|drive| drive.observed().path == path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DriveStore;
    use crate::crd::{DriveStatus, ManagedDriveSpec, ManagedDriveStatus};
    use crate::error::Error;
    use assert_matches::assert_matches;
    use k8s_openapi::api::core::v1::ConfigMap;
    use kube::api::{ApiResource, DynamicObject};
    use kube::ResourceExt;
    use std::sync::Arc;

    fn make_drive(name: &str, node: &str, status: DriveStatus, fs_uuid: &str) -> DynamicObject {
        let mut drive = ManagedDrive::new(name, ManagedDriveSpec::default());
        drive.status = Some(ManagedDriveStatus {
            node_name: node.into(),
            path: format!("/dev/{}", name),
            uevent_fs_uuid: fs_uuid.into(),
            drive_status: status,
            ..Default::default()
        });
        drive.to_dynamic().unwrap()
    }

    fn selector_with(items: Vec<DynamicObject>) -> DriveSelector {
        let store: Arc<DriveStore> = DriveStore::new();
        store.replace(items);
        DriveSelector::new("node-1", StoreReader::new(store))
    }

    fn names(drives: &[ManagedDrive]) -> Vec<String> {
        drives.iter().map(|d| d.observed().path.clone()).collect()
    }

    #[test]
    fn test_filter_by_uevent_fs_uuid() {
        let selector = selector_with(vec![
            make_drive("sda", "node-1", DriveStatus::Ready, "uuid-a"),
            make_drive("sdb", "node-1", DriveStatus::Available, "uuid-b"),
            make_drive("sdc", "node-1", DriveStatus::InUse, "uuid-a"),
            make_drive("sdd", "node-2", DriveStatus::Ready, "uuid-a"),
        ]);

        let found = selector.filter_by_uevent_fs_uuid("uuid-a").unwrap();
        assert_eq!(names(&found), vec!["/dev/sda", "/dev/sdc"]);

        assert!(selector.filter_by_uevent_fs_uuid("uuid-z").unwrap().is_empty());
    }

    #[test]
    fn test_list_drives_partitions_node_drives() {
        let selector = selector_with(vec![
            make_drive("sda", "node-1", DriveStatus::Ready, ""),
            make_drive("sdb", "node-1", DriveStatus::InUse, ""),
            make_drive("sdc", "node-1", DriveStatus::Available, ""),
            make_drive("sdd", "node-1", DriveStatus::Released, ""),
            make_drive("sde", "node-1", DriveStatus::Error, ""),
            make_drive("sdf", "node-2", DriveStatus::Ready, ""),
        ]);

        let drives = selector.list_drives().unwrap();
        assert_eq!(names(&drives.managed), vec!["/dev/sda", "/dev/sdb"]);
        assert_eq!(names(&drives.non_managed), vec!["/dev/sdc", "/dev/sdd", "/dev/sde"]);
        assert_eq!(drives.total(), 5);
    }

    #[test]
    fn test_empty_store() {
        let selector = selector_with(vec![]);
        assert_eq!(selector.list_drives().unwrap(), PartitionedDrives::default());
        assert!(selector.find_by_path("/dev/sda").unwrap().is_none());
    }

    #[test]
    fn test_find_by_path() {
        let selector = selector_with(vec![
            make_drive("sda", "node-1", DriveStatus::Ready, ""),
            make_drive("sdb", "node-2", DriveStatus::Ready, ""),
        ]);

        let sda = selector.find_by_path("/dev/sda").unwrap().unwrap();
        assert_eq!(sda.name_any(), "sda");
        assert!(selector.find_by_path("/dev/sdb").unwrap().is_none());
    }

    #[test]
    fn test_foreign_object_is_type_mismatch() {
        let foreign = DynamicObject::new("kube-root-ca", &ApiResource::erase::<ConfigMap>(&()));
        let selector = selector_with(vec![
            make_drive("sda", "node-1", DriveStatus::Ready, ""),
            foreign,
        ]);

        assert_matches!(selector.list_drives(), Err(Error::TypeMismatch { .. }));
        assert_matches!(
            selector.filter_by_uevent_fs_uuid(""),
            Err(Error::TypeMismatch { .. })
        );
    }
}
