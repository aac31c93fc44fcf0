//! Listener: receives datagrams on the node's socket and folds them into the
//! directory.
use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::directory::{join_file_list, Directory};
use crate::error::DecodeError;
use crate::node::NodeId;
use crate::protocol::{decode_message, Announcement, Message, NodeSummary, MAX_DATAGRAM_SIZE};
use crate::transport::UdpTransport;

/// What a received datagram did to the directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Sender promoted to Online with its announced files
    Announced(NodeId),
    /// Announcement from an id the directory does not know; nothing changed
    UnknownSender(NodeId),
    /// Our own announcement echoed back; ignored
    OwnAnnouncement,
    /// Snapshot applied to `applied` nodes, `skipped` were self or unknown
    Snapshot { applied: usize, skipped: usize },
}

#[derive(Clone, Debug)]
pub struct Listener {
    node_id: NodeId,
    directory: Directory,
    transport: UdpTransport,
}

impl Listener {
    pub fn new(node_id: NodeId, directory: Directory, transport: UdpTransport) -> Self {
        Self {
            node_id,
            directory,
            transport,
        }
    }

    /// Decode one datagram and apply it as of `now`
    pub fn handle_datagram(
        &self,
        data: &[u8],
        from: SocketAddr,
        now: DateTime<Utc>,
    ) -> Result<Delivery, DecodeError> {
        let delivery = match decode_message(data)? {
            Message::Announcement(announcement) => self.apply_announcement(announcement, from, now),
            Message::Snapshot(summaries) => self.apply_snapshot(summaries, from),
        };
        Ok(delivery)
    }

    fn apply_announcement(
        &self,
        announcement: Announcement,
        from: SocketAddr,
        now: DateTime<Utc>,
    ) -> Delivery {
        let sender = announcement.sender_id;
        if sender == self.node_id {
            debug!("[Node<{}>] Ignoring own announcement from {}", self.node_id, from);
            return Delivery::OwnAnnouncement;
        }

        let files = announcement.files();
        if !self.directory.record_announcement(sender, files, now) {
            debug!(
                "[Node<{}>] Discarded announcement from unknown node {} at {}",
                self.node_id, sender, from
            );
            return Delivery::UnknownSender(sender);
        }
        info!(
            "[Node<{}>] Updated node {}: Status = Online, Files = {}",
            self.node_id, sender, announcement.payload
        );
        Delivery::Announced(sender)
    }

    fn apply_snapshot(&self, summaries: Vec<NodeSummary>, from: SocketAddr) -> Delivery {
        info!(
            "[Node<{}>] Received membership snapshot of {} nodes from {}",
            self.node_id,
            summaries.len(),
            from
        );
        let mut applied = 0;
        let mut skipped = 0;
        for summary in summaries {
            if summary.node_id == self.node_id {
                skipped += 1;
                continue;
            }
            let files = join_file_list(&summary.files);
            if self
                .directory
                .apply_summary(summary.node_id, summary.status, summary.files)
            {
                info!(
                    "[Node<{}>] Node {}: Status = {}, Files = {}",
                    self.node_id, summary.node_id, summary.status, files
                );
                applied += 1;
            } else {
                skipped += 1;
            }
        }
        Delivery::Snapshot { applied, skipped }
    }

    /// Receive and apply datagrams until cancelled. Nothing received over
    /// the wire can stop this loop.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            "[Node<{}>] Listening on {}",
            self.node_id,
            self.transport.local_addr()
        );
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = self.transport.recv_from(&mut buf) => received,
            };
            let (len, from) = match received {
                Ok(received) => received,
                Err(e) => {
                    warn!("[Node<{}>] {}", self.node_id, e);
                    continue;
                }
            };
            if len == buf.len() {
                warn!(
                    "[Node<{}>] Datagram from {} filled the {} byte buffer and may be truncated",
                    self.node_id, from, MAX_DATAGRAM_SIZE
                );
            }
            if let Err(e) = self.handle_datagram(&buf[..len], from, Utc::now()) {
                self.transport.record_decode_error();
                warn!(
                    "[Node<{}>] Dropped malformed datagram from {}: {}",
                    self.node_id, from, e
                );
            }
        }
        info!("[Node<{}>] Listener stopped", self.node_id);
    }
}
