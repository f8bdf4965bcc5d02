//! Error types for OpenShowVar
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using OsvError
pub type Result<T> = std::result::Result<T, OsvError>;

/// Unified error type for OpenShowVar operations
#[derive(Debug, Error)]
pub enum OsvError {
    // -------------------------------------------------------------------------
    // Input Errors (rejected locally, nothing is sent)
    // -------------------------------------------------------------------------
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{field} too large: {len} bytes (max {max})")]
    ValueTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },

    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed by controller")]
    ConnectionClosed,

    #[error("Timed out waiting for reply")]
    Timeout,

    /// An earlier exchange left the stream in an unknown state
    #[error("Session broken by an earlier failure; reconnect")]
    SessionBroken,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Text encoding error: {0}")]
    Encoding(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Framing and correlation failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("truncated frame: expected at least {expected} bytes, got {actual}")]
    TruncatedFrame { expected: usize, actual: usize },

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("sequence mismatch: sent {expected}, reply carried {received}")]
    SequenceMismatch { expected: u16, received: u16 },

    #[error("controller rejected request {sequence_id} (status {status:02x?})")]
    ControllerRejected { sequence_id: u16, status: [u8; 3] },
}

impl OsvError {
    /// True for the failures a plain client reports as "no matching reply":
    /// no reply at all, a reply for another request, or a rejected request.
    pub fn is_no_match(&self) -> bool {
        matches!(
            self,
            OsvError::ConnectionClosed
                | OsvError::Timeout
                | OsvError::Protocol(ProtocolError::SequenceMismatch { .. })
                | OsvError::Protocol(ProtocolError::ControllerRejected { .. })
        )
    }

    /// Framing corruption. The stream position is unknown afterwards, so the
    /// session should be dropped and reconnected.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OsvError::Protocol(ProtocolError::TruncatedFrame { .. })
                | OsvError::Protocol(ProtocolError::MalformedFrame(_))
        )
    }

    /// Peer unreachable, closed, or the socket failed
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            OsvError::Connect { .. }
                | OsvError::Io(_)
                | OsvError::ConnectionClosed
                | OsvError::Timeout
                | OsvError::SessionBroken
        )
    }

    /// True when the session can no longer correlate replies with requests:
    /// no reply arrived, the stream ended or failed, or framing was lost.
    pub fn breaks_session(&self) -> bool {
        self.is_fatal()
            || matches!(
                self,
                OsvError::Io(_)
                    | OsvError::ConnectionClosed
                    | OsvError::Timeout
                    | OsvError::SessionBroken
            )
    }

    /// Input validation failure
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            OsvError::InvalidInput(_) | OsvError::ValueTooLarge { .. }
        )
    }
}

/// Map a read-side I/O failure to the session-level error it stands for
pub(crate) fn classify_read_error(err: std::io::Error) -> OsvError {
    match err.kind() {
        std::io::ErrorKind::UnexpectedEof
        | std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::ConnectionAborted => OsvError::ConnectionClosed,
        // Unix reports an expired read timeout as WouldBlock, Windows as TimedOut
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => OsvError::Timeout,
        _ => OsvError::Io(err),
    }
}
