//! Announcer: periodically tells the coordinator (or every peer) which files
//! this node hosts.
use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::schedule::RandomSchedule;
use crate::directory::Directory;
use crate::node::NodeId;
use crate::protocol::encode_announcement;
use crate::transport::Sender;

/// Where announcements go
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnounceTarget {
    /// Client/server topology: one fixed coordinator address
    Coordinator(SocketAddr),
    /// Full mesh: every other node in the directory
    Peers,
}

pub struct Announcer<S: Sender> {
    node_id: NodeId,
    directory: Directory,
    sender: Arc<S>,
    target: AnnounceTarget,
    schedule: RandomSchedule,
}

impl<S: Sender> Announcer<S> {
    pub fn new(
        node_id: NodeId,
        directory: Directory,
        sender: Arc<S>,
        target: AnnounceTarget,
        schedule: RandomSchedule,
    ) -> Self {
        Self {
            node_id,
            directory,
            sender,
            target,
            schedule,
        }
    }

    /// Send one announcement of the node's current files.
    /// Returns how many destinations accepted the datagram.
    pub async fn announce_once(&self) -> usize {
        let Some(own) = self.directory.get(self.node_id) else {
            warn!(
                "[Node<{}>] Not in the directory, nothing to announce",
                self.node_id
            );
            return 0;
        };
        let data = encode_announcement(self.node_id, &own.files);

        match self.target {
            AnnounceTarget::Coordinator(address) => {
                match self.sender.send_to(address, &data).await {
                    Ok(()) => {
                        debug!(
                            "[Node<{}>] Announced {} files to coordinator {}",
                            self.node_id,
                            own.files.len(),
                            address
                        );
                        1
                    }
                    Err(e) => {
                        warn!(
                            "[Node<{}>] Announcement to coordinator {} failed: {}",
                            self.node_id, address, e
                        );
                        0
                    }
                }
            }
            AnnounceTarget::Peers => {
                let peers = self.directory.peers_of(self.node_id);
                let delivered = self.sender.send_to_each(&peers, &data).await;
                debug!(
                    "[Node<{}>] Announced {} files to {}/{} peers",
                    self.node_id,
                    own.files.len(),
                    delivered,
                    peers.len()
                );
                delivered
            }
        }
    }

    /// Wait a random delay, announce, repeat until cancelled
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            "[Node<{}>] Announcer started, target: {:?}",
            self.node_id, self.target
        );
        loop {
            let delay = self.schedule.next_delay(&mut rand::thread_rng());
            debug!(
                "[Node<{}>] Next announcement in {}s",
                self.node_id,
                delay.as_secs()
            );
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            self.announce_once().await;
        }
        info!("[Node<{}>] Announcer stopped", self.node_id);
    }
}
