//! Simulated Controller
//!
//! Speaks the controller side of the protocol over an in-memory variable
//! table. Used by the tests and benches, and by `osv-sim` for working
//! without a robot.
//!
//! ## Behavior
//! - Read of a known variable: value, success status
//! - Read of an unknown variable: empty value, failure status
//! - Write: stores the value and echoes it
//! - Replies echo the request's sequence id and flag

mod variables;
mod connection;
mod server;

pub use variables::VariableTable;
pub use connection::Connection;
pub use server::{SimHandle, SimServer};
