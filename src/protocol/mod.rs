//! Wire protocol: message types and their binary codec
pub mod codec;
pub mod messages;

pub use codec::{
    decode_announcement, decode_message, decode_snapshot, encode_announcement, encode_message,
    encode_snapshot,
};
pub use messages::{Announcement, Message, MessageKind, NodeSummary, PROTOCOL_VERSION};

/// Receive buffer size; comfortably above the largest expected snapshot
pub const MAX_DATAGRAM_SIZE: usize = 4096;
