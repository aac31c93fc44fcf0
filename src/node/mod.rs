//! Membership node: one bound socket plus the loops its role calls for.
//!
//! | role        | listener | announcer         | monitor | broadcaster |
//! |-------------|----------|-------------------|---------|-------------|
//! | coordinator | yes      |                   | yes     | yes         |
//! | client      | yes      | to coordinator    |         |             |
//! | peer        | yes      | to every other    | yes     |             |
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub mod node_id;

use crate::directory::{Directory, NodeStatus};
use crate::error::{Result, RosterError};
use crate::membership::{AnnounceTarget, Announcer, Listener, LivenessMonitor, SnapshotBroadcaster};
use crate::settings::{Role, Settings};
use crate::transport::UdpTransport;
pub use node_id::{validate_node_id, NodeId};

#[derive(Debug)]
pub struct MembershipNode {
    node_id: NodeId,
    role: Role,
    directory: Directory,
    transport: UdpTransport,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl MembershipNode {
    /// Bind the port registered for `settings.node_id` and start the role's loops
    pub async fn start(settings: &Settings, directory: Directory) -> Result<Self> {
        let own = directory
            .get(settings.node_id)
            .ok_or(RosterError::UnknownNode(settings.node_id))?;
        settings.validate()?;

        let transport = UdpTransport::bind(settings.bind_address(own.address)).await?;
        Self::with_transport(settings, directory, transport)
    }

    /// Start the role's loops on an already bound transport
    pub fn with_transport(
        settings: &Settings,
        directory: Directory,
        transport: UdpTransport,
    ) -> Result<Self> {
        let node_id = settings.node_id;
        if !directory.contains(node_id) {
            return Err(RosterError::UnknownNode(node_id));
        }
        settings.validate()?;
        let schedule = settings.announce_schedule()?;

        // A running node is by definition reachable
        directory.set_status(node_id, NodeStatus::Online);
        directory.mark_seen(node_id, Utc::now());

        info!(
            "[Node<{}>] Starting as {} on {} with {} known nodes",
            node_id,
            settings.role,
            transport.local_addr(),
            directory.len()
        );

        let shutdown = CancellationToken::new();
        let sender = Arc::new(transport.clone());
        let mut tasks = Vec::new();

        let listener = Listener::new(node_id, directory.clone(), transport.clone());
        tasks.push(tokio::spawn(listener.run(shutdown.child_token())));

        match settings.role {
            Role::Coordinator => {
                let monitor = LivenessMonitor::new(
                    node_id,
                    directory.clone(),
                    settings.liveness_timeout(),
                    settings.monitor_interval(),
                )?;
                tasks.push(tokio::spawn(monitor.run(shutdown.child_token())));

                let broadcaster =
                    SnapshotBroadcaster::new(node_id, directory.clone(), sender, schedule);
                tasks.push(tokio::spawn(broadcaster.run(shutdown.child_token())));
            }
            Role::Client => {
                let announcer = Announcer::new(
                    node_id,
                    directory.clone(),
                    sender,
                    AnnounceTarget::Coordinator(settings.coordinator_address),
                    schedule,
                );
                tasks.push(tokio::spawn(announcer.run(shutdown.child_token())));
            }
            Role::Peer => {
                let announcer = Announcer::new(
                    node_id,
                    directory.clone(),
                    sender,
                    AnnounceTarget::Peers,
                    schedule,
                );
                tasks.push(tokio::spawn(announcer.run(shutdown.child_token())));

                let monitor = LivenessMonitor::new(
                    node_id,
                    directory.clone(),
                    settings.liveness_timeout(),
                    settings.monitor_interval(),
                )?;
                tasks.push(tokio::spawn(monitor.run(shutdown.child_token())));
            }
        }
        debug!("[Node<{}>] {} tasks spawned", node_id, tasks.len());

        Ok(Self {
            node_id,
            role: settings.role,
            directory,
            transport,
            shutdown,
            tasks,
        })
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn transport(&self) -> &UdpTransport {
        &self.transport
    }

    /// Token cancelled when the node shuts down; other services can tie
    /// their lifetime to it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop every loop and wait for them to finish
    pub async fn shutdown(self) -> Result<()> {
        info!("[Node<{}>] Shutting down", self.node_id);
        self.shutdown.cancel();
        for task in self.tasks {
            task.await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::directory::DirectoryEntry;

    async fn loopback() -> UdpTransport {
        UdpTransport::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap()
    }

    fn fast_settings(role: Role, id: u32) -> Settings {
        let mut settings = Settings::new(role, NodeId::new(id));
        settings.announce_min_secs = 1;
        settings.announce_max_secs = 1;
        settings.liveness_timeout_secs = 3;
        settings.monitor_interval_secs = 1;
        settings
    }

    async fn wait_for_status(directory: &Directory, id: u32, status: NodeStatus) -> bool {
        for _ in 0..50 {
            if directory.get(NodeId::new(id)).map(|r| r.status) == Some(status) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_start_unknown_node() {
        let directory = Directory::from_entries(vec![DirectoryEntry {
            id: NodeId::new(1),
            address: "127.0.0.1:0".parse().unwrap(),
            files: vec![],
        }]);
        let settings = Settings::new(Role::Peer, NodeId::new(9));
        let result = MembershipNode::start(&settings, directory).await;
        assert!(matches!(result, Err(RosterError::UnknownNode(id)) if id == NodeId::new(9)));
    }

    #[tokio::test]
    async fn test_start_marks_self_online() {
        let directory = Directory::from_entries(vec![DirectoryEntry {
            id: NodeId::new(1),
            address: "127.0.0.1:0".parse().unwrap(),
            files: vec!["a.txt".to_string()],
        }]);
        let mut settings = fast_settings(Role::Coordinator, 1);
        settings.listen_address = "127.0.0.1".parse().unwrap();

        let node = MembershipNode::start(&settings, directory).await.unwrap();
        let own = node.directory().get(NodeId::new(1)).unwrap();
        assert_eq!(own.status, NodeStatus::Online);
        assert!(own.last_seen.is_some());
        assert_eq!(node.role(), Role::Coordinator);
        node.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_coordinator_and_client_converge() {
        let coordinator_transport = loopback().await;
        let client_transport = loopback().await;
        let entries = vec![
            DirectoryEntry {
                id: NodeId::new(1),
                address: coordinator_transport.local_addr(),
                files: vec![],
            },
            DirectoryEntry {
                id: NodeId::new(2),
                address: client_transport.local_addr(),
                files: vec!["b.txt".to_string()],
            },
        ];

        let coordinator = MembershipNode::with_transport(
            &fast_settings(Role::Coordinator, 1),
            Directory::from_entries(entries.clone()),
            coordinator_transport.clone(),
        )
        .unwrap();

        let mut client_settings = fast_settings(Role::Client, 2);
        client_settings.coordinator_address = coordinator_transport.local_addr();
        let client = MembershipNode::with_transport(
            &client_settings,
            Directory::from_entries(entries),
            client_transport,
        )
        .unwrap();

        // Coordinator learns of the client from its announcement
        assert!(wait_for_status(coordinator.directory(), 2, NodeStatus::Online).await);
        let seen = coordinator.directory().get(NodeId::new(2)).unwrap();
        assert_eq!(seen.files, vec!["b.txt".to_string()]);

        // Client learns the coordinator is up from a snapshot
        assert!(wait_for_status(client.directory(), 1, NodeStatus::Online).await);

        client.shutdown().await.unwrap();
        coordinator.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_token_is_cancelled() {
        let transport = loopback().await;
        let directory = Directory::from_entries(vec![DirectoryEntry {
            id: NodeId::new(1),
            address: transport.local_addr(),
            files: vec![],
        }]);
        let node =
            MembershipNode::with_transport(&fast_settings(Role::Peer, 1), directory, transport)
                .unwrap();
        let token = node.shutdown_token();
        assert!(!token.is_cancelled());
        node.shutdown().await.unwrap();
        assert!(token.is_cancelled());
    }
}
