//! Domain Ports - Core trait definitions for the drive reconciler
//!
//! These traits define the boundaries between the reconciliation logic and the
//! cluster API. Adapters implement these traits to provide concrete transport.

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use kube::api::DynamicObject;
use std::sync::Arc;

// =============================================================================
// Node ID
// =============================================================================

/// Identity of the node whose drives are being reconciled
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&String> for NodeId {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

// =============================================================================
// List / Watch Types
// =============================================================================

/// Full listing of the drive records scoped to one node
#[derive(Debug, Clone, Default)]
pub struct DriveList {
    /// Objects as delivered by the API server
    pub items: Vec<DynamicObject>,
    /// Version token the listing is consistent with
    pub version: String,
}

/// A single change notification on the drive watch stream
#[derive(Debug, Clone)]
pub enum DriveWatchEvent {
    Added(DynamicObject),
    Modified(DynamicObject),
    Deleted(DynamicObject),
    /// Progress marker carrying only a newer version token
    Bookmark(String),
}

impl DriveWatchEvent {
    /// Version token this event advances the watch to, if any
    pub fn version(&self) -> Option<&str> {
        match self {
            DriveWatchEvent::Added(obj)
            | DriveWatchEvent::Modified(obj)
            | DriveWatchEvent::Deleted(obj) => obj.metadata.resource_version.as_deref(),
            DriveWatchEvent::Bookmark(version) => Some(version),
        }
    }
}

/// Stream of watch events. Ends when the server closes the watch.
pub type DriveWatchStream = BoxStream<'static, Result<DriveWatchEvent>>;

// =============================================================================
// Drive Lister/Watcher Port
// =============================================================================

/// Port for the remote drive-record API.
///
/// Both calls are scoped to a single node. Transport failures are returned as
/// errors and retried by the caller; they never reach the classification path.
#[async_trait]
pub trait DriveListerWatcher: Send + Sync {
    /// List all drive records of a node
    async fn list(&self, node: &NodeId) -> Result<DriveList>;

    /// Watch drive records of a node starting after `version`
    async fn watch(&self, node: &NodeId, version: &str) -> Result<DriveWatchStream>;
}

pub type DriveListerWatcherRef = Arc<dyn DriveListerWatcher>;

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ApiResource;

    #[test]
    fn test_node_id_conversions() {
        let id: NodeId = "node-1".into();
        assert_eq!(id.as_str(), "node-1");
        assert_eq!(format!("{}", id), "node-1");
        assert_eq!(NodeId::from(String::from("node-1")), id);
    }

    #[test]
    fn test_watch_event_version() {
        let ar = ApiResource::erase::<crate::crd::ManagedDrive>(&());
        let mut obj = DynamicObject::new("drive-1", &ar);
        obj.metadata.resource_version = Some("42".into());

        assert_eq!(DriveWatchEvent::Added(obj.clone()).version(), Some("42"));
        assert_eq!(DriveWatchEvent::Deleted(obj).version(), Some("42"));
        assert_eq!(DriveWatchEvent::Bookmark("43".into()).version(), Some("43"));
    }
}
