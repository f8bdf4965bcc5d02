//! Variable table
//!
//! BTreeMap-based store with RwLock for concurrency.

use std::collections::BTreeMap;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::protocol::{Flag, Request, STATUS_FAILED, STATUS_OK};

/// In-memory controller variables, keyed by name
pub struct VariableTable {
    data: RwLock<BTreeMap<String, Bytes>>,
}

impl VariableTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Table seeded with the variables the shell touches on startup
    pub fn with_defaults() -> Self {
        let table = Self::new();
        table.set("$OV_PRO", "100");
        table.set("$ROBNAME[]", "\"KR16 SIM\"");
        table
    }

    /// Get a value by name (read lock)
    pub fn get(&self, name: &str) -> Option<Bytes> {
        self.data.read().get(name).cloned()
    }

    /// Set a value (write lock)
    pub fn set(&self, name: impl Into<String>, value: impl Into<Bytes>) {
        self.data.write().insert(name.into(), value.into());
    }

    /// Remove a value (write lock)
    pub fn remove(&self, name: &str) -> Option<Bytes> {
        self.data.write().remove(name)
    }

    /// Get entry count
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Apply a request the way a controller does.
    ///
    /// Returns the reply flag, value and status.
    pub fn apply(&self, request: &Request) -> (Flag, Bytes, [u8; 3]) {
        let name = String::from_utf8_lossy(request.name()).into_owned();
        match request {
            Request::Read { .. } => match self.get(&name) {
                Some(value) => (Flag::Read, value, STATUS_OK),
                None => (Flag::Read, Bytes::new(), STATUS_FAILED),
            },
            Request::Write { value, .. } => {
                self.set(name, value.clone());
                (Flag::Write, value.clone(), STATUS_OK)
            }
        }
    }
}

impl Default for VariableTable {
    fn default() -> Self {
        Self::new()
    }
}
