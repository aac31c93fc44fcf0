//! Binary framing for membership messages
//!
//! ```text
//! message      := kind:u8 body
//! Announcement := record
//! Snapshot     := count:u32 record{count}
//! record       := version:u8 sender_id:u32 payload_length:u32 payload
//! ```
//!
//! Integers are big-endian. The payload length is checked against the bytes
//! actually present before any slice is taken, so a lying length field
//! yields a `DecodeError` rather than a panic or a large allocation.
use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::messages::{Announcement, Message, MessageKind, NodeSummary, PROTOCOL_VERSION};
use crate::directory::NodeRecord;
use crate::error::DecodeError;
use crate::node::NodeId;

/// version + sender_id + payload_length
pub const RECORD_HEADER_LEN: usize = 1 + 4 + 4;

pub fn encode_announcement(sender_id: NodeId, files: &[String]) -> Bytes {
    encode_message(&Message::Announcement(Announcement::new(sender_id, files)))
}

pub fn encode_snapshot(records: &[NodeRecord]) -> Bytes {
    let summaries = records.iter().map(NodeSummary::from_record).collect();
    encode_message(&Message::Snapshot(summaries))
}

pub fn encode_message(message: &Message) -> Bytes {
    let mut buf = BytesMut::with_capacity(64);
    buf.put_u8(message.kind() as u8);
    match message {
        Message::Announcement(announcement) => put_record(&mut buf, announcement),
        Message::Snapshot(summaries) => {
            buf.put_u32(summaries.len() as u32);
            for summary in summaries {
                put_record(&mut buf, &summary.to_announcement());
            }
        }
    }
    buf.freeze()
}

pub fn decode_announcement(data: &[u8]) -> Result<Announcement, DecodeError> {
    match decode_message(data)? {
        Message::Announcement(announcement) => Ok(announcement),
        other => Err(DecodeError::UnexpectedKind {
            expected: MessageKind::Announcement as u8,
            found: other.kind() as u8,
        }),
    }
}

pub fn decode_snapshot(data: &[u8]) -> Result<Vec<NodeSummary>, DecodeError> {
    match decode_message(data)? {
        Message::Snapshot(summaries) => Ok(summaries),
        other => Err(DecodeError::UnexpectedKind {
            expected: MessageKind::Snapshot as u8,
            found: other.kind() as u8,
        }),
    }
}

pub fn decode_message(data: &[u8]) -> Result<Message, DecodeError> {
    let mut buf = data;
    if !buf.has_remaining() {
        return Err(DecodeError::Empty);
    }

    let message = match MessageKind::try_from(buf.get_u8())? {
        MessageKind::Announcement => Message::Announcement(get_record(&mut buf)?),
        MessageKind::Snapshot => {
            ensure_remaining(&buf, 4)?;
            let count = buf.get_u32() as usize;
            // never trust the count for allocation
            let mut summaries = Vec::with_capacity(count.min(buf.remaining() / RECORD_HEADER_LEN));
            for _ in 0..count {
                summaries.push(NodeSummary::from_announcement(get_record(&mut buf)?)?);
            }
            Message::Snapshot(summaries)
        }
    };

    if buf.has_remaining() {
        return Err(DecodeError::TrailingBytes(buf.remaining()));
    }
    Ok(message)
}

fn put_record(buf: &mut BytesMut, record: &Announcement) {
    buf.reserve(RECORD_HEADER_LEN + record.payload.len());
    buf.put_u8(record.version);
    buf.put_u32(record.sender_id.value());
    buf.put_u32(record.payload.len() as u32);
    buf.put_slice(record.payload.as_bytes());
}

fn get_record(buf: &mut &[u8]) -> Result<Announcement, DecodeError> {
    ensure_remaining(buf, RECORD_HEADER_LEN)?;
    let version = buf.get_u8();
    if version != PROTOCOL_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }
    let sender_id = NodeId::new(buf.get_u32());
    let payload_length = buf.get_u32();

    let available = buf.remaining();
    if payload_length as usize > available {
        return Err(DecodeError::PayloadLength {
            declared: payload_length,
            available,
        });
    }
    let remaining: &[u8] = *buf;
    let (payload, rest) = remaining.split_at(payload_length as usize);
    let payload = std::str::from_utf8(payload)
        .map_err(|_| DecodeError::InvalidUtf8)?
        .to_string();
    *buf = rest;

    Ok(Announcement {
        version,
        sender_id,
        payload_length,
        payload,
    })
}

fn ensure_remaining(buf: &&[u8], needed: usize) -> Result<(), DecodeError> {
    let remaining = buf.remaining();
    if remaining < needed {
        return Err(DecodeError::Truncated { needed, remaining });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::NodeStatus;

    fn files(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn record(id: u32, status: NodeStatus, names: &[&str]) -> NodeRecord {
        NodeRecord {
            status,
            ..NodeRecord::new(
                NodeId::new(id),
                format!("127.0.0.1:{}", 5000 + id).parse().unwrap(),
                files(names),
            )
        }
    }

    #[test]
    fn test_announcement_round_trip() {
        let bytes = encode_announcement(NodeId::new(1), &files(&["a.txt", "b.txt"]));
        let announcement = decode_announcement(&bytes).unwrap();
        assert_eq!(announcement.sender_id, NodeId::new(1));
        assert_eq!(announcement.version, PROTOCOL_VERSION);
        assert_eq!(announcement.payload_length, 11);
        assert_eq!(announcement.files(), files(&["a.txt", "b.txt"]));
    }

    #[test]
    fn test_empty_announcement_round_trip() {
        let bytes = encode_announcement(NodeId::new(7), &[]);
        assert_eq!(bytes.len(), 1 + RECORD_HEADER_LEN);
        let announcement = decode_announcement(&bytes).unwrap();
        assert_eq!(announcement.payload, "");
        assert!(announcement.files().is_empty());
    }

    #[test]
    fn test_announcement_wire_layout() {
        let bytes = encode_announcement(NodeId::new(0x0102_0304), &files(&["ab"]));
        assert_eq!(
            bytes.as_ref(),
            &[0x01, PROTOCOL_VERSION, 0x01, 0x02, 0x03, 0x04, 0, 0, 0, 2, b'a', b'b']
        );
    }

    #[test]
    fn test_snapshot_fan_out_shape() {
        let records = vec![
            record(1, NodeStatus::Online, &["a.txt"]),
            record(2, NodeStatus::Offline, &[]),
            record(3, NodeStatus::Online, &["c.txt", "d.txt"]),
        ];
        let summaries = decode_snapshot(&encode_snapshot(&records)).unwrap();

        assert_eq!(summaries.len(), 3);
        for (summary, source) in summaries.iter().zip(&records) {
            assert_eq!(summary.node_id, source.id);
            assert_eq!(summary.status.to_string(), source.status.to_string());
            assert_eq!(summary.files, source.files);
        }
        assert!(summaries[1].files.is_empty());
    }

    #[test]
    fn test_empty_snapshot_round_trip() {
        let summaries = decode_snapshot(&encode_snapshot(&[])).unwrap();
        assert!(summaries.is_empty());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(decode_message(&[]), Err(DecodeError::Empty));
        assert_eq!(decode_message(&[0x09, 1, 2]), Err(DecodeError::UnknownKind(0x09)));
        assert!(matches!(
            decode_message(&[0x01, PROTOCOL_VERSION, 0, 0]),
            Err(DecodeError::Truncated { .. })
        ));
        assert!(matches!(
            decode_message(&[0x02, 0, 0]),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_lying_payload_length() {
        let mut bytes = encode_announcement(NodeId::new(1), &files(&["abc"])).to_vec();
        // declared length 200, only 3 bytes present
        bytes[9] = 200;
        assert_eq!(
            decode_message(&bytes),
            Err(DecodeError::PayloadLength {
                declared: 200,
                available: 3
            })
        );
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut bytes = encode_announcement(NodeId::new(1), &files(&["abc"])).to_vec();
        bytes.extend_from_slice(&[0xde, 0xad]);
        assert_eq!(decode_message(&bytes), Err(DecodeError::TrailingBytes(2)));
    }

    #[test]
    fn test_decode_rejects_other_versions() {
        let mut bytes = encode_announcement(NodeId::new(1), &[]).to_vec();
        bytes[1] = PROTOCOL_VERSION + 1;
        assert_eq!(
            decode_message(&bytes),
            Err(DecodeError::UnsupportedVersion(PROTOCOL_VERSION + 1))
        );
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let bytes = [0x01, PROTOCOL_VERSION, 0, 0, 0, 1, 0, 0, 0, 2, 0xff, 0xfe];
        assert_eq!(decode_message(&bytes), Err(DecodeError::InvalidUtf8));
    }

    #[test]
    fn test_snapshot_count_larger_than_records() {
        let mut bytes = encode_snapshot(&[record(1, NodeStatus::Online, &[])]).to_vec();
        bytes[4] = 9;
        assert!(matches!(
            decode_snapshot(&bytes),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_kind_mismatch() {
        let announcement = encode_announcement(NodeId::new(1), &[]);
        assert_eq!(
            decode_snapshot(&announcement),
            Err(DecodeError::UnexpectedKind {
                expected: 0x02,
                found: 0x01
            })
        );
        let snapshot = encode_snapshot(&[]);
        assert!(matches!(
            decode_announcement(&snapshot),
            Err(DecodeError::UnexpectedKind { .. })
        ));
    }

    #[test]
    fn test_snapshot_with_non_summary_payload() {
        // a snapshot whose record carries a bare file list
        let mut buf = BytesMut::new();
        buf.put_u8(MessageKind::Snapshot as u8);
        buf.put_u32(1);
        put_record(&mut buf, &Announcement::new(NodeId::new(1), &files(&["a.txt"])));
        assert!(matches!(
            decode_snapshot(&buf),
            Err(DecodeError::MalformedSummary(_))
        ));
    }
}
