use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::node::NodeId;

/// Main error type for the roster membership service
#[derive(Debug)]
pub enum RosterError {
    /// Configuration, directory file or CLI argument errors
    Config(String),

    /// Socket bind/send/receive errors
    Transport(String),

    /// Datagram decoding errors
    Decode(DecodeError),

    /// A node id with no directory entry
    UnknownNode(NodeId),

    /// System I/O errors
    Io(std::io::Error),

    /// Task join or shutdown errors
    Concurrency(String),
}

/// Reasons a datagram could not be decoded into a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Zero-length datagram
    Empty,

    /// Leading kind byte is not a known message kind
    UnknownKind(u8),

    /// Decoded a valid message of a different kind than requested
    UnexpectedKind { expected: u8, found: u8 },

    /// Buffer ended before a field could be read
    Truncated { needed: usize, remaining: usize },

    /// Bytes left over after the last field
    TrailingBytes(usize),

    /// Declared payload length exceeds the bytes present in the datagram
    PayloadLength { declared: u32, available: usize },

    /// Payload is not valid UTF-8
    InvalidUtf8,

    /// Record carries a protocol version this build does not speak
    UnsupportedVersion(u8),

    /// Snapshot summary payload lacks the `status|files` delimiter
    MalformedSummary(String),

    /// Snapshot summary status is neither Online nor Offline
    UnknownStatus(String),
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterError::Config(msg) => write!(f, "Configuration error: {}", msg),
            RosterError::Transport(msg) => write!(f, "Transport error: {}", msg),
            RosterError::Decode(err) => write!(f, "Decode error: {}", err),
            RosterError::UnknownNode(id) => write!(f, "Unknown node: {}", id),
            RosterError::Io(err) => write!(f, "I/O error: {}", err),
            RosterError::Concurrency(msg) => write!(f, "Concurrency error: {}", msg),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Empty => write!(f, "empty datagram"),
            DecodeError::UnknownKind(kind) => write!(f, "unknown message kind {:#04x}", kind),
            DecodeError::UnexpectedKind { expected, found } => write!(
                f,
                "expected message kind {:#04x}, found {:#04x}",
                expected, found
            ),
            DecodeError::Truncated { needed, remaining } => write!(
                f,
                "truncated: needed {} bytes, {} remaining",
                needed, remaining
            ),
            DecodeError::TrailingBytes(count) => write!(f, "{} trailing bytes", count),
            DecodeError::PayloadLength {
                declared,
                available,
            } => write!(
                f,
                "payload length {} exceeds {} available bytes",
                declared, available
            ),
            DecodeError::InvalidUtf8 => write!(f, "payload is not valid UTF-8"),
            DecodeError::UnsupportedVersion(version) => {
                write!(f, "unsupported protocol version {}", version)
            }
            DecodeError::MalformedSummary(payload) => {
                write!(f, "summary payload without status delimiter: {:?}", payload)
            }
            DecodeError::UnknownStatus(status) => write!(f, "unknown status {:?}", status),
        }
    }
}

impl std::error::Error for RosterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterError::Io(err) => Some(err),
            RosterError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl std::error::Error for DecodeError {}

// Convenient type alias for Results using our error type
pub type Result<T> = std::result::Result<T, RosterError>;

impl IntoResponse for RosterError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = json!({
            "error": {
                "code": status_code.as_u16(),
                "message": self.to_string(),
                "type": self.error_type(),
            }
        });

        (status_code, Json(error_response)).into_response()
    }
}

impl RosterError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RosterError::Config(_) => StatusCode::BAD_REQUEST,
            RosterError::UnknownNode(_) => StatusCode::NOT_FOUND,
            RosterError::Decode(_) => StatusCode::BAD_REQUEST,
            RosterError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
            RosterError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RosterError::Concurrency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            RosterError::Config(_) => "configuration_error",
            RosterError::Transport(_) => "transport_error",
            RosterError::Decode(_) => "decode_error",
            RosterError::UnknownNode(_) => "unknown_node",
            RosterError::Io(_) => "io_error",
            RosterError::Concurrency(_) => "concurrency_error",
        }
    }
}

impl From<std::io::Error> for RosterError {
    fn from(err: std::io::Error) -> Self {
        RosterError::Io(err)
    }
}

impl From<DecodeError> for RosterError {
    fn from(err: DecodeError) -> Self {
        RosterError::Decode(err)
    }
}

impl From<tokio::task::JoinError> for RosterError {
    fn from(err: tokio::task::JoinError) -> Self {
        RosterError::Concurrency(format!("Task failed: {}", err))
    }
}

// Helper macros for common error construction patterns
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::RosterError::Config($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::RosterError::Config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! transport_error {
    ($msg:expr) => {
        $crate::error::RosterError::Transport($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::RosterError::Transport(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_err = RosterError::Config("Invalid port".to_string());
        assert_eq!(config_err.to_string(), "Configuration error: Invalid port");

        let io_err = RosterError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "File not found",
        ));
        assert!(io_err.to_string().contains("I/O error"));

        let decode_err = RosterError::from(DecodeError::UnknownKind(0x7f));
        assert_eq!(
            decode_err.to_string(),
            "Decode error: unknown message kind 0x7f"
        );
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let roster_err: RosterError = io_err.into();

        assert!(matches!(roster_err, RosterError::Io(_)));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            RosterError::UnknownNode(NodeId::new(9)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            transport_error!("bind failed").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_macros() {
        let err = config_error!("Port {} is invalid", 65536);
        assert_eq!(
            err.to_string(),
            "Configuration error: Port 65536 is invalid"
        );

        let err = transport_error!("socket closed");
        assert_eq!(err.to_string(), "Transport error: socket closed");
    }
}
