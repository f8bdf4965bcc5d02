//! Response definitions
//!
//! Represents replies from the controller.

use bytes::Bytes;

/// Status trailer the controller sends for a successful request
pub const STATUS_OK: [u8; 3] = [0x00, 0x01, 0x01];

/// Status trailer for a failed request
pub const STATUS_FAILED: [u8; 3] = [0x00, 0x00, 0x00];

/// A decoded reply frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Sequence id echoed from the request
    pub sequence_id: u16,

    /// Flag byte echoed from the request
    pub flag: u8,

    /// Variable value (the echoed value for writes)
    pub value: Bytes,

    /// Status trailer
    pub status: [u8; 3],
}

impl Response {
    /// Only the last status byte carries the outcome
    pub fn is_success(&self) -> bool {
        self.status[2] == 0x01
    }
}
