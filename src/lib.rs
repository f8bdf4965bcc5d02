//! # OpenShowVar
//!
//! Client for the OpenShowVar variable protocol spoken by robot-controller
//! variable proxies:
//! - Binary request/response codec with big-endian 16-bit length fields
//! - Sequence-id correlation of each request with its reply
//! - Blocking TCP session with one outstanding request
//! - Background keep-alive and variable polling
//! - Interactive shell and a simulated controller
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐      ┌──────────────────────┐
//! │        Shell         │      │      Scheduler       │
//! │ (menu, activity log) │      │ (keep-alive, polls)  │
//! └──────────┬───────────┘      └──────────┬───────────┘
//!            │                             │
//! ┌──────────▼─────────────────────────────▼───────────┐
//! │                  SharedSession                      │
//! │          (one exchange at a time, Mutex)            │
//! └─────────────────────────┬──────────────────────────┘
//!                           │
//! ┌─────────────────────────▼──────────────────────────┐
//! │                     Session                         │
//! │      encode → send → read frame → decode            │
//! └──────────┬───────────────────────────┬─────────────┘
//!            │                           │
//!            ▼                           ▼
//!   ┌─────────────────┐         ┌─────────────────┐
//!   │   Wire Codec    │         │ SequenceTracker │
//!   └─────────────────┘         └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod shell;
pub mod sim;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{OsvError, ProtocolError, Result};
pub use config::{Config, TextEncoding};
pub use network::{Session, SharedSession};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
