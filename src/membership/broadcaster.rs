//! Snapshot Broadcaster (coordinator role)
//!
//! Periodically copies the whole directory into a snapshot and sends it to
//! every other node, one datagram per destination.
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::schedule::RandomSchedule;
use crate::directory::Directory;
use crate::node::NodeId;
use crate::protocol::{encode_snapshot, MAX_DATAGRAM_SIZE};
use crate::transport::Sender;

pub struct SnapshotBroadcaster<S: Sender> {
    node_id: NodeId,
    directory: Directory,
    sender: Arc<S>,
    schedule: RandomSchedule,
}

impl<S: Sender> SnapshotBroadcaster<S> {
    pub fn new(
        node_id: NodeId,
        directory: Directory,
        sender: Arc<S>,
        schedule: RandomSchedule,
    ) -> Self {
        Self {
            node_id,
            directory,
            sender,
            schedule,
        }
    }

    /// Send the current snapshot to every other node.
    /// Returns the number of destinations that accepted it.
    pub async fn broadcast_once(&self) -> usize {
        let records = self.directory.snapshot();
        let data = encode_snapshot(&records);
        if data.len() > MAX_DATAGRAM_SIZE {
            warn!(
                "[Node<{}>] Snapshot of {} bytes exceeds the {} byte receive buffer",
                self.node_id,
                data.len(),
                MAX_DATAGRAM_SIZE
            );
        }

        let targets = self.directory.peers_of(self.node_id);
        let delivered = self.sender.send_to_each(&targets, &data).await;
        debug!(
            "[Node<{}>] Sent snapshot of {} nodes to {}/{} nodes",
            self.node_id,
            records.len(),
            delivered,
            targets.len()
        );
        delivered
    }

    pub async fn run(self, shutdown: CancellationToken) {
        info!("[Node<{}>] Snapshot broadcaster started", self.node_id);
        loop {
            let delay = self.schedule.next_delay(&mut rand::thread_rng());
            debug!(
                "[Node<{}>] Next broadcast in {}s",
                self.node_id,
                delay.as_secs()
            );
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            self.broadcast_once().await;
        }
        info!("[Node<{}>] Snapshot broadcaster stopped", self.node_id);
    }
}
