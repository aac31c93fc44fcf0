//! Transport traits
//!
//! The announce and broadcast loops only ever send, so they depend on this
//! trait rather than on the socket type.
use std::net::SocketAddr;

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::node::NodeId;

/// Fire-and-forget datagram sender
#[async_trait]
pub trait Sender: Send + Sync {
    /// Send one datagram to `target`
    async fn send_to(&self, target: SocketAddr, data: &[u8]) -> Result<()>;

    /// Send the same datagram to every target independently.
    ///
    /// A failed send is logged and does not stop the remaining sends.
    /// Returns the number of successful sends.
    async fn send_to_each(&self, targets: &[(NodeId, SocketAddr)], data: &[u8]) -> usize {
        let mut delivered = 0;
        for (node_id, address) in targets {
            match self.send_to(*address, data).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Failed to send to node {} at {}: {}", node_id, address, e),
            }
        }
        delivered
    }
}
