//! Kubernetes-backed drive lister/watcher

use crate::crd::{ManagedDrive, NODE_LABEL};
use crate::domain::ports::{DriveList, DriveListerWatcher, DriveWatchEvent, DriveWatchStream, NodeId};
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use kube::api::{Api, ApiResource, DynamicObject, ListParams, WatchEvent, WatchParams};
use kube::core::TypeMeta;
use kube::Client;

/// Server-side watch timeout, kept under the API server's 5 minute cap
const DEFAULT_WATCH_TIMEOUT_SECS: u32 = 290;

/// Label selector matching the drive records of one node
pub fn node_selector(node: &NodeId) -> String {
    format!("{}={}", NODE_LABEL, node)
}

/// Lists and watches ManagedDrive objects through the API server
#[derive(Clone)]
pub struct KubeDriveSource {
    api: Api<DynamicObject>,
    resource: ApiResource,
    watch_timeout_secs: u32,
}

impl KubeDriveSource {
    pub fn new(client: Client) -> Self {
        let resource = ApiResource::erase::<ManagedDrive>(&());
        Self {
            api: Api::all_with(client, &resource),
            resource,
            watch_timeout_secs: DEFAULT_WATCH_TIMEOUT_SECS,
        }
    }

    pub fn with_watch_timeout(mut self, secs: u32) -> Self {
        self.watch_timeout_secs = secs;
        self
    }

    /// List items may come back without apiVersion/kind; restore them so the
    /// typed view does not reject valid records.
    fn with_types(&self, mut obj: DynamicObject) -> DynamicObject {
        if obj.types.is_none() {
            obj.types = Some(TypeMeta {
                api_version: self.resource.api_version.clone(),
                kind: self.resource.kind.clone(),
            });
        }
        obj
    }
}

#[async_trait]
impl DriveListerWatcher for KubeDriveSource {
    async fn list(&self, node: &NodeId) -> Result<DriveList> {
        let params = ListParams::default().labels(&node_selector(node));
        let list = self.api.list(&params).await?;

        Ok(DriveList {
            version: list.metadata.resource_version.unwrap_or_default(),
            items: list.items.into_iter().map(|obj| self.with_types(obj)).collect(),
        })
    }

    async fn watch(&self, node: &NodeId, version: &str) -> Result<DriveWatchStream> {
        let params = WatchParams::default()
            .labels(&node_selector(node))
            .timeout(self.watch_timeout_secs);
        let source = self.clone();

        let stream = self
            .api
            .watch(&params, version)
            .await?
            .map_err(Error::from)
            .and_then(move |event| {
                let mapped = match event {
                    WatchEvent::Added(obj) => Ok(DriveWatchEvent::Added(source.with_types(obj))),
                    WatchEvent::Modified(obj) => Ok(DriveWatchEvent::Modified(source.with_types(obj))),
                    WatchEvent::Deleted(obj) => Ok(DriveWatchEvent::Deleted(source.with_types(obj))),
                    WatchEvent::Bookmark(bookmark) => {
                        Ok(DriveWatchEvent::Bookmark(bookmark.metadata.resource_version))
                    }
                    WatchEvent::Error(e) => Err(Error::WatchFailed(format!(
                        "{} (code {})",
                        e.message, e.code
                    ))),
                };
                futures::future::ready(mapped)
            });

        Ok(stream.boxed())
    }
}
