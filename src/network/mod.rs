//! Network Module
//!
//! Client side of the controller connection.
//!
//! ## Architecture
//! - `Session`: one TCP connection, one outstanding request
//! - `SharedSession`: the session behind a lock for multiple callers
//! - `Scheduler`: keep-alive and watch jobs on background threads

mod session;
mod shared;
mod scheduler;

pub use session::{probe, Session};
pub use shared::SharedSession;
pub use scheduler::{Job, JobEvent, JobKind, Scheduler};
