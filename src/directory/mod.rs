//! Node Directory
//!
//! The shared table of every known node: its fixed address plus the mutable
//! liveness status, hosted files and last-seen time. The set of nodes is
//! fixed when the directory is loaded; afterwards only the mutable fields of
//! each record change. One lock guards the whole map so every read observes
//! a consistent view.
pub mod loader;

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::node::NodeId;
pub use loader::{load_directory_file, parse_directory, DirectoryEntry};

/// Liveness of a node as seen by this process
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum NodeStatus {
    Online,
    #[default]
    Offline,
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeStatus::Online => write!(f, "Online"),
            NodeStatus::Offline => write!(f, "Offline"),
        }
    }
}

impl std::str::FromStr for NodeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Online" => Ok(NodeStatus::Online),
            "Offline" => Ok(NodeStatus::Offline),
            _ => Err(format!("Invalid node status: {}", s)),
        }
    }
}

/// One known node
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub address: SocketAddr,
    pub status: NodeStatus,
    pub files: Vec<String>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl NodeRecord {
    /// A freshly loaded record: offline and never seen
    pub fn new(id: NodeId, address: SocketAddr, files: Vec<String>) -> Self {
        Self {
            id,
            address,
            status: NodeStatus::Offline,
            files,
            last_seen: None,
        }
    }
}

/// Split a comma-joined file list. The empty string is the empty list.
pub fn split_file_list(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    joined.split(',').map(str::to_string).collect()
}

pub fn join_file_list(files: &[String]) -> String {
    files.join(",")
}

/// Shared handle to the node table
///
/// Cloning is cheap; every clone refers to the same records.
#[derive(Clone, Debug, Default)]
pub struct Directory {
    nodes: Arc<RwLock<IndexMap<NodeId, NodeRecord>>>,
}

impl Directory {
    /// Build a directory from loaded entries, keeping their order.
    ///
    /// A repeated id keeps the first entry.
    pub fn from_entries(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
        let mut nodes = IndexMap::new();
        for entry in entries {
            if nodes.contains_key(&entry.id) {
                warn!("Duplicate directory entry for node {} ignored", entry.id);
                continue;
            }
            nodes.insert(
                entry.id,
                NodeRecord::new(entry.id, entry.address, entry.files),
            );
        }
        Self {
            nodes: Arc::new(RwLock::new(nodes)),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.read().contains_key(&id)
    }

    /// All node ids in directory order
    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.read().keys().copied().collect()
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRecord> {
        self.nodes.read().get(&id).cloned()
    }

    /// Every node except `id`, as `(id, address)` pairs
    pub fn peers_of(&self, id: NodeId) -> Vec<(NodeId, SocketAddr)> {
        self.nodes
            .read()
            .values()
            .filter(|record| record.id != id)
            .map(|record| (record.id, record.address))
            .collect()
    }

    /// Consistent copy of all records taken under one lock
    pub fn snapshot(&self) -> Vec<NodeRecord> {
        self.nodes.read().values().cloned().collect()
    }

    pub fn set_status(&self, id: NodeId, status: NodeStatus) -> bool {
        self.update(id, "set status", |record| record.status = status)
    }

    pub fn set_files(&self, id: NodeId, files: Vec<String>) -> bool {
        self.update(id, "set files", |record| record.files = files)
    }

    pub fn mark_seen(&self, id: NodeId, time: DateTime<Utc>) -> bool {
        self.update(id, "mark seen", |record| record.last_seen = Some(time))
    }

    /// Apply an accepted announcement: new files, Online, last seen at `time`.
    pub fn record_announcement(&self, id: NodeId, files: Vec<String>, time: DateTime<Utc>) -> bool {
        self.update(id, "record announcement", |record| {
            if record.status == NodeStatus::Offline {
                info!("Node {} is now Online", record.id);
            }
            record.files = files;
            record.status = NodeStatus::Online;
            record.last_seen = Some(time);
        })
    }

    /// Replace status and files of a node from a coordinator snapshot
    pub fn apply_summary(&self, id: NodeId, status: NodeStatus, files: Vec<String>) -> bool {
        self.update(id, "apply snapshot summary", |record| {
            record.status = status;
            record.files = files;
        })
    }

    /// Demote every node other than `local_id` whose last contact is absent or
    /// older than `timeout` at `now`. Returns the ids that went from Online to
    /// Offline.
    pub fn demote_stale(&self, local_id: NodeId, now: DateTime<Utc>, timeout: Duration) -> Vec<NodeId> {
        let mut demoted = Vec::new();
        let mut nodes = self.nodes.write();
        for record in nodes.values_mut() {
            if record.id == local_id {
                continue;
            }
            let stale = match record.last_seen {
                None => true,
                Some(seen) => now.signed_duration_since(seen) > timeout,
            };
            if stale && record.status == NodeStatus::Online {
                demoted.push(record.id);
            }
            if stale {
                record.status = NodeStatus::Offline;
            }
        }
        demoted
    }

    fn update<F>(&self, id: NodeId, action: &str, apply: F) -> bool
    where
        F: FnOnce(&mut NodeRecord),
    {
        let mut nodes = self.nodes.write();
        match nodes.get_mut(&id) {
            Some(record) => {
                apply(record);
                debug!("Node {}: {}", id, action);
                true
            }
            None => {
                warn!("Cannot {} for unknown node {}", action, id);
                false
            }
        }
    }
}
