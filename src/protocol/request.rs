//! Request definitions
//!
//! Represents requests sent to the controller.

use bytes::Bytes;

/// Request flag byte (also echoed in the reply)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Flag {
    Read = 0x00,
    Write = 0x01,
}

impl Flag {
    /// Parse a flag byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Flag::Read),
            0x01 => Some(Flag::Write),
            _ => None,
        }
    }
}

/// A variable access request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Read a variable by name
    Read { name: Bytes },

    /// Set a variable to a value
    Write { name: Bytes, value: Bytes },
}

impl Request {
    /// Build a read request
    pub fn read(name: impl Into<Bytes>) -> Self {
        Request::Read { name: name.into() }
    }

    /// Build a write request
    pub fn write(name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Request::Write {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Get the request flag
    pub fn flag(&self) -> Flag {
        match self {
            Request::Read { .. } => Flag::Read,
            Request::Write { .. } => Flag::Write,
        }
    }

    /// Variable name
    pub fn name(&self) -> &Bytes {
        match self {
            Request::Read { name } | Request::Write { name, .. } => name,
        }
    }

    /// Value carried by a write
    pub fn value(&self) -> Option<&Bytes> {
        match self {
            Request::Read { .. } => None,
            Request::Write { value, .. } => Some(value),
        }
    }
}
