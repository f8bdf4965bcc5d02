//! Shared Session
//!
//! A session behind a mutex, for callers on several threads (the scheduler
//! and the shell). The lock is held for a whole request/response exchange.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;

use super::session::{probe, Session};
use crate::config::Config;
use crate::error::Result;

/// Cloneable handle to one exclusively-accessed session
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,

    /// Controller address, kept outside the lock so probes never wait
    addr: String,

    probe_timeout: Duration,
}

impl SharedSession {
    /// Wrap a connected session
    pub fn new(session: Session) -> Self {
        let addr = session.config().addr();
        let probe_timeout = session.config().connect_timeout();
        Self {
            inner: Arc::new(Mutex::new(session)),
            addr,
            probe_timeout,
        }
    }

    /// Connect and wrap
    pub fn connect_with(config: Config) -> Result<Self> {
        Session::connect_with(config).map(Self::new)
    }

    pub fn read(&self, name: &str) -> Result<Bytes> {
        self.inner.lock().read(name)
    }

    pub fn read_text(&self, name: &str) -> Result<String> {
        self.inner.lock().read_text(name)
    }

    pub fn write(&self, name: &str, value: &str) -> Result<Bytes> {
        self.inner.lock().write(name, value)
    }

    pub fn keep_alive(&self) -> Result<()> {
        self.inner.lock().keep_alive()
    }

    pub fn keep_alive_var(&self, name: &str) -> Result<()> {
        self.inner.lock().keep_alive_var(name)
    }

    /// Probe over a separate connection, without taking the lock
    pub fn is_reachable(&self) -> bool {
        probe(&self.addr, self.probe_timeout)
    }

    pub fn sequence_id(&self) -> u16 {
        self.inner.lock().sequence_id()
    }

    /// Controller address
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Close the session.
    ///
    /// The last handle closes it outright; otherwise the socket is shut down
    /// and the remaining handles see connection errors.
    pub fn close(self) -> Result<()> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner().close(),
            Err(shared) => shared.lock().shutdown(),
        }
    }
}
