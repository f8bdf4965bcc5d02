//! Sequence tracker
//!
//! Correlates the single outstanding request with its reply. The protocol
//! has no acknowledgment or retransmission layer; the sequence id is the only
//! guard against applying a stale or duplicated reply to a later request.

use rand::Rng;

/// Owner of the outgoing message-sequence number.
///
/// The id advances (wrapping at 65535) only when a reply carries the current
/// id and reports success. It never moves backwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceTracker {
    current: u16,
}

impl SequenceTracker {
    /// Start at a random id in `1..=100`
    pub fn random() -> Self {
        Self::starting_at(rand::thread_rng().gen_range(1..=100))
    }

    /// Start at a fixed id
    pub fn starting_at(id: u16) -> Self {
        Self { current: id }
    }

    /// The id the next request will carry
    pub fn next_id(&self) -> u16 {
        self.current
    }

    /// Check a reply; advance and return true iff it matches and succeeded
    pub fn confirm(&mut self, received_id: u16, success: bool) -> bool {
        if received_id != self.current || !success {
            return false;
        }
        self.current = self.current.wrapping_add(1);
        true
    }
}

impl Default for SequenceTracker {
    fn default() -> Self {
        Self::random()
    }
}
