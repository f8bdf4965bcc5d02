//! Protocol Module
//!
//! Defines the OpenShowVar wire protocol spoken with the controller's
//! variable proxy.
//!
//! ## Protocol Format
//!
//! ### Request Format
//! ```text
//! ┌────────┬───────────┬─────────┬─────────────────────────────┐
//! │ Id (2) │ BodyLen(2)│ Flag(1) │           Payload           │
//! └────────┴───────────┴─────────┴─────────────────────────────┘
//! ```
//!
//! ### Flags
//! - 0x00: READ  - Payload: name_len (2) + name
//! - 0x01: WRITE - Payload: name_len (2) + name + value_len (2) + value
//!
//! ### Response Format
//! ```text
//! ┌────────┬───────────┬─────────┬──────────────┬───────┬────────────┐
//! │ Id (2) │ BodyLen(2)│ Flag(1) │ ValueLen (2) │ Value │ Status (3) │
//! └────────┴───────────┴─────────┴──────────────┴───────┴────────────┘
//! ```
//!
//! ### Status
//! - last byte 0x01: success
//! - anything else:  the controller rejected the request

mod request;
mod response;
mod codec;
mod sequence;

pub use request::{Flag, Request};
pub use response::{Response, STATUS_FAILED, STATUS_OK};
pub use codec::{
    decode_request, decode_response, encode_read, encode_request, encode_response, encode_write,
    read_request, read_response, write_frame, MAX_FIELD_LEN, MAX_RESPONSE_VALUE_LEN,
    MIN_RESPONSE_SIZE, PREFIX_SIZE, REQUEST_HEADER_SIZE, RESPONSE_HEADER_SIZE, STATUS_SIZE,
};
pub use sequence::SequenceTracker;
