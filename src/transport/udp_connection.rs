//! UDP Transport Implementation
//!
//! One bound socket per process, shared by the listener (receive side) and
//! the announce/broadcast loops (send side).
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::info;

use super::stats::{FrozenTransportStats, TransportStats};
use super::traits::Sender;
use crate::error::{Result, RosterError};
use crate::transport_error;

#[derive(Clone, Debug)]
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    stats: Arc<TransportStats>,
}

impl UdpTransport {
    /// Bind the node's socket. Failure here is fatal for the node.
    pub async fn bind(bind_addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| transport_error!("Failed to bind UDP socket on {}: {}", bind_addr, e))?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| transport_error!("Failed to read local address: {}", e))?;
        info!("UDP transport bound on {}", local_addr);

        Ok(Self {
            socket: Arc::new(socket),
            local_addr,
            stats: Arc::new(TransportStats::default()),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the next datagram. No timeout: silence is the liveness
    /// monitor's business, not the receiver's.
    pub async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        match self.socket.recv_from(buf).await {
            Ok(received) => {
                self.stats.record_received();
                Ok(received)
            }
            Err(e) => {
                self.stats.record_receive_error();
                Err(transport_error!("Receive failed: {}", e))
            }
        }
    }

    pub fn record_decode_error(&self) {
        self.stats.record_decode_error();
    }

    pub fn stats(&self) -> FrozenTransportStats {
        self.stats.freeze()
    }
}

#[async_trait]
impl Sender for UdpTransport {
    async fn send_to(&self, target: SocketAddr, data: &[u8]) -> Result<()> {
        let result = match self.socket.send_to(data, target).await {
            Ok(sent) if sent == data.len() => Ok(()),
            Ok(sent) => Err(transport_error!(
                "Partial send to {}: {}/{} bytes",
                target,
                sent,
                data.len()
            )),
            Err(e) => Err(RosterError::Transport(format!(
                "Failed to send to {}: {}",
                target, e
            ))),
        };
        match result {
            Ok(()) => self.stats.record_sent(),
            Err(_) => self.stats.record_send_error(),
        }
        result
    }
}
