//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! All integers are big-endian `u16` unless noted.
//!
//! ### Request Format
//! ```text
//! ┌────────┬──────────┬─────────┬──────────┬──────┬───────────┬───────┐
//! │ Id (2) │ BodyLen  │ Flag(1) │ NameLen  │ Name │ ValueLen  │ Value │
//! │        │   (2)    │         │   (2)    │      │ (2, write)│(write)│
//! └────────┴──────────┴─────────┴──────────┴──────┴───────────┴───────┘
//! ```
//! `BodyLen` counts every byte after itself: `3 + name_len` for a read,
//! `3 + name_len + 2 + value_len` for a write.
//!
//! ### Response Format
//! ```text
//! ┌────────┬──────────┬─────────┬──────────┬───────┬────────────┐
//! │ Id (2) │ BodyLen  │ Flag(1) │ ValueLen │ Value │ Status (3) │
//! │        │   (2)    │         │   (2)    │       │            │
//! └────────┴──────────┴─────────┴──────────┴───────┴────────────┘
//! ```
//! The value length is taken from the frame size, not from `ValueLen`:
//! `value_len = frame_len - 7 - 3`.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{Flag, Request, Response};
use crate::error::{classify_read_error, OsvError, ProtocolError, Result};

/// Sequence id + body length, the part that precedes every body
pub const PREFIX_SIZE: usize = 4;

/// Request header: id (2) + body_len (2) + flag (1) + name_len (2)
pub const REQUEST_HEADER_SIZE: usize = 7;

/// Response header: id (2) + body_len (2) + flag (1) + value_len (2)
pub const RESPONSE_HEADER_SIZE: usize = 7;

/// Status trailer size
pub const STATUS_SIZE: usize = 3;

/// Smallest well-formed reply (empty value)
pub const MIN_RESPONSE_SIZE: usize = RESPONSE_HEADER_SIZE + STATUS_SIZE;

/// Length fields are 16-bit
pub const MAX_FIELD_LEN: usize = u16::MAX as usize;

/// Largest reply value whose body length still fits the 16-bit field
pub const MAX_RESPONSE_VALUE_LEN: usize = MAX_FIELD_LEN - (MIN_RESPONSE_SIZE - PREFIX_SIZE);

fn check_len(field: &'static str, len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(OsvError::ValueTooLarge { field, len, max });
    }
    Ok(())
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a read request
///
/// Format: id (2) + body_len (2) + flag 0 (1) + name_len (2) + name
pub fn encode_read(sequence_id: u16, name: &[u8]) -> Result<Bytes> {
    encode_frame(sequence_id, Flag::Read, name, None)
}

/// Encode a write request
///
/// Format: id (2) + body_len (2) + flag 1 (1) + name_len (2) + name
///         + value_len (2) + value
pub fn encode_write(sequence_id: u16, name: &[u8], value: &[u8]) -> Result<Bytes> {
    encode_frame(sequence_id, Flag::Write, name, Some(value))
}

/// Encode any request
pub fn encode_request(sequence_id: u16, request: &Request) -> Result<Bytes> {
    match request {
        Request::Read { name } => encode_read(sequence_id, name),
        Request::Write { name, value } => encode_write(sequence_id, name, value),
    }
}

fn encode_frame(sequence_id: u16, flag: Flag, name: &[u8], value: Option<&[u8]>) -> Result<Bytes> {
    check_len("variable name", name.len(), MAX_FIELD_LEN)?;

    let mut body_len = 1 + 2 + name.len();
    if let Some(value) = value {
        check_len("variable value", value.len(), MAX_FIELD_LEN)?;
        body_len += 2 + value.len();
    }
    check_len("frame body", body_len, MAX_FIELD_LEN)?;

    let mut frame = BytesMut::with_capacity(PREFIX_SIZE + body_len);
    frame.put_u16(sequence_id);
    frame.put_u16(body_len as u16);
    frame.put_u8(flag as u8);
    frame.put_u16(name.len() as u16);
    frame.put_slice(name);
    if let Some(value) = value {
        frame.put_u16(value.len() as u16);
        frame.put_slice(value);
    }

    Ok(frame.freeze())
}

/// Decode a request frame (controller side)
///
/// Returns the sequence id and the request
pub fn decode_request(bytes: &[u8]) -> Result<(u16, Request)> {
    if bytes.len() < REQUEST_HEADER_SIZE {
        return Err(ProtocolError::TruncatedFrame {
            expected: REQUEST_HEADER_SIZE,
            actual: bytes.len(),
        }
        .into());
    }

    let mut header = &bytes[..REQUEST_HEADER_SIZE];
    let sequence_id = header.get_u16();
    let body_len = header.get_u16() as usize;
    let flag_byte = header.get_u8();
    let name_len = header.get_u16() as usize;

    if PREFIX_SIZE + body_len != bytes.len() {
        return Err(ProtocolError::MalformedFrame(format!(
            "body length {} does not match frame of {} bytes",
            body_len,
            bytes.len()
        ))
        .into());
    }

    let flag = Flag::from_byte(flag_byte).ok_or_else(|| {
        ProtocolError::MalformedFrame(format!("unknown request flag: 0x{:02x}", flag_byte))
    })?;

    let name_end = REQUEST_HEADER_SIZE + name_len;
    if bytes.len() < name_end {
        return Err(ProtocolError::TruncatedFrame {
            expected: name_end,
            actual: bytes.len(),
        }
        .into());
    }
    let name = Bytes::copy_from_slice(&bytes[REQUEST_HEADER_SIZE..name_end]);

    let request = match flag {
        Flag::Read => {
            if bytes.len() != name_end {
                return Err(ProtocolError::MalformedFrame(format!(
                    "read request: {} trailing bytes",
                    bytes.len() - name_end
                ))
                .into());
            }
            Request::Read { name }
        }
        Flag::Write => {
            if bytes.len() < name_end + 2 {
                return Err(ProtocolError::TruncatedFrame {
                    expected: name_end + 2,
                    actual: bytes.len(),
                }
                .into());
            }
            let value_len = u16::from_be_bytes([bytes[name_end], bytes[name_end + 1]]) as usize;
            let value_end = name_end + 2 + value_len;
            if bytes.len() != value_end {
                return Err(ProtocolError::MalformedFrame(format!(
                    "write request: value length {} does not match remaining {} bytes",
                    value_len,
                    bytes.len() - name_end - 2
                ))
                .into());
            }
            Request::Write {
                name,
                value: Bytes::copy_from_slice(&bytes[name_end + 2..value_end]),
            }
        }
    };

    Ok((sequence_id, request))
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a reply frame (controller side)
///
/// Format: id (2) + body_len (2) + flag (1) + value_len (2) + value + status (3)
pub fn encode_response(sequence_id: u16, flag: u8, value: &[u8], status: [u8; 3]) -> Result<Bytes> {
    check_len("reply value", value.len(), MAX_RESPONSE_VALUE_LEN)?;

    let body_len = 1 + 2 + value.len() + STATUS_SIZE;
    let mut frame = BytesMut::with_capacity(PREFIX_SIZE + body_len);
    frame.put_u16(sequence_id);
    frame.put_u16(body_len as u16);
    frame.put_u8(flag);
    frame.put_u16(value.len() as u16);
    frame.put_slice(value);
    frame.put_slice(&status);

    Ok(frame.freeze())
}

/// Decode a reply frame
///
/// `bytes` must hold exactly one frame; the value length is derived from its
/// size.
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    if bytes.len() < MIN_RESPONSE_SIZE {
        return Err(ProtocolError::TruncatedFrame {
            expected: MIN_RESPONSE_SIZE,
            actual: bytes.len(),
        }
        .into());
    }

    let mut header = &bytes[..RESPONSE_HEADER_SIZE];
    let sequence_id = header.get_u16();
    let body_len = header.get_u16();
    let flag = header.get_u8();
    let declared_len = header.get_u16() as usize;

    let value_len = bytes.len() - MIN_RESPONSE_SIZE;
    if declared_len != value_len {
        tracing::debug!(
            "Reply {} declares value length {} but carries {} bytes (body_len {})",
            sequence_id,
            declared_len,
            value_len,
            body_len
        );
    }

    let value_end = RESPONSE_HEADER_SIZE + value_len;
    let value = Bytes::copy_from_slice(&bytes[RESPONSE_HEADER_SIZE..value_end]);
    let mut status = [0u8; STATUS_SIZE];
    status.copy_from_slice(&bytes[value_end..]);

    Ok(Response {
        sequence_id,
        flag,
        value,
        status,
    })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one length-prefixed frame: the 4-byte prefix, then `body_len` bytes
fn read_frame<R: Read>(reader: &mut R, min_size: usize) -> Result<Vec<u8>> {
    let mut prefix = [0u8; PREFIX_SIZE];
    reader.read_exact(&mut prefix).map_err(classify_read_error)?;

    let body_len = u16::from_be_bytes([prefix[2], prefix[3]]) as usize;
    if PREFIX_SIZE + body_len < min_size {
        return Err(ProtocolError::TruncatedFrame {
            expected: min_size,
            actual: PREFIX_SIZE + body_len,
        }
        .into());
    }

    let mut frame = vec![0u8; PREFIX_SIZE + body_len];
    frame[..PREFIX_SIZE].copy_from_slice(&prefix);
    reader
        .read_exact(&mut frame[PREFIX_SIZE..])
        .map_err(classify_read_error)?;

    tracing::trace!("Read frame: {:02x?}", frame);
    Ok(frame)
}

/// Read a complete reply from a stream
///
/// Blocks until a complete frame is received or an error occurs
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let frame = read_frame(reader, MIN_RESPONSE_SIZE)?;
    decode_response(&frame)
}

/// Read a complete request from a stream (controller side)
pub fn read_request<R: Read>(reader: &mut R) -> Result<(u16, Request)> {
    let frame = read_frame(reader, REQUEST_HEADER_SIZE)?;
    decode_request(&frame)
}

/// Write an encoded frame to a stream
pub fn write_frame<W: Write>(writer: &mut W, frame: &[u8]) -> Result<()> {
    tracing::trace!("Write frame: {:02x?}", frame);
    writer.write_all(frame)?;
    writer.flush()?;
    Ok(())
}
