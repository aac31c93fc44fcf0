//! Membership Message Protocol
//!
//! Two messages travel between nodes. An `Announcement` is a node's report of
//! its own files. A snapshot is the coordinator's view of every node, sent as
//! a list of announcement-shaped records whose payload carries
//! `status|files` instead of a bare file list.
use crate::directory::{join_file_list, split_file_list, NodeRecord, NodeStatus};
use crate::error::DecodeError;
use crate::node::NodeId;

/// Protocol version written into every record
pub const PROTOCOL_VERSION: u8 = 1;

/// Separator between status and file list in a snapshot summary payload
pub const STATUS_DELIMITER: char = '|';

/// Leading byte of every datagram
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    Announcement = 0x01,
    Snapshot = 0x02,
}

impl TryFrom<u8> for MessageKind {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(MessageKind::Announcement),
            0x02 => Ok(MessageKind::Snapshot),
            other => Err(DecodeError::UnknownKind(other)),
        }
    }
}

/// A node's self-report of identity and hosted files
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Announcement {
    pub version: u8,
    pub sender_id: NodeId,
    /// Byte length of `payload`; informational only
    pub payload_length: u32,
    pub payload: String,
}

impl Announcement {
    pub fn new(sender_id: NodeId, files: &[String]) -> Self {
        Self::with_payload(sender_id, join_file_list(files))
    }

    pub fn with_payload(sender_id: NodeId, payload: String) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            sender_id,
            payload_length: payload.len() as u32,
            payload,
        }
    }

    /// Decoded file list; an empty payload means no files
    pub fn files(&self) -> Vec<String> {
        split_file_list(&self.payload)
    }
}

/// One node's entry in a membership snapshot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSummary {
    pub version: u8,
    pub node_id: NodeId,
    pub status: NodeStatus,
    pub files: Vec<String>,
}

impl NodeSummary {
    pub fn from_record(record: &NodeRecord) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            node_id: record.id,
            status: record.status,
            files: record.files.clone(),
        }
    }

    /// Pack into the announcement shape used on the wire
    pub fn to_announcement(&self) -> Announcement {
        let payload = format!(
            "{}{}{}",
            self.status,
            STATUS_DELIMITER,
            join_file_list(&self.files)
        );
        Announcement {
            version: self.version,
            ..Announcement::with_payload(self.node_id, payload)
        }
    }

    /// Unpack an announcement-shaped record, splitting on the first `|`
    pub fn from_announcement(record: Announcement) -> Result<Self, DecodeError> {
        let (status, files) = record
            .payload
            .split_once(STATUS_DELIMITER)
            .ok_or_else(|| DecodeError::MalformedSummary(record.payload.clone()))?;
        let status = status
            .parse::<NodeStatus>()
            .map_err(|_| DecodeError::UnknownStatus(status.to_string()))?;

        Ok(Self {
            version: record.version,
            node_id: record.sender_id,
            status,
            files: split_file_list(files),
        })
    }
}

/// Any decoded datagram
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Announcement(Announcement),
    Snapshot(Vec<NodeSummary>),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Announcement(_) => MessageKind::Announcement,
            Message::Snapshot(_) => MessageKind::Snapshot,
        }
    }
}
