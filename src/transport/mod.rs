//! UDP Transport Module
//!
//! A single bound UDP socket per node, used for both directions. Sends are
//! fire-and-forget; nothing is acknowledged or retried.
pub mod stats;
pub mod traits;
pub mod udp_connection;

pub use stats::{FrozenTransportStats, TransportStats};
pub use traits::Sender;
pub use udp_connection::UdpTransport;
