//! TCP Server
//!
//! Accepts connections and hands each one to its own handler thread.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use super::{Connection, VariableTable};
use crate::error::Result;

/// Simulated controller listening for protocol clients
pub struct SimServer {
    listener: TcpListener,
    variables: Arc<VariableTable>,
    local_addr: SocketAddr,

    /// Close connections idle for this long (milliseconds, 0 = never)
    idle_timeout_ms: u64,

    shutdown: Arc<AtomicBool>,
}

impl SimServer {
    /// Bind to `addr` (use port 0 for an ephemeral port)
    pub fn bind(addr: &str, variables: Arc<VariableTable>) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Simulated controller listening on {}", local_addr);

        Ok(Self {
            listener,
            variables,
            local_addr,
            idle_timeout_ms: 0,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Set the per-connection idle timeout
    pub fn with_idle_timeout_ms(mut self, ms: u64) -> Self {
        self.idle_timeout_ms = ms;
        self
    }

    /// Address actually bound
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until shut down (blocking)
    pub fn run(&self) -> Result<()> {
        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }

            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    continue;
                }
            };

            let variables = Arc::clone(&self.variables);
            let idle_timeout_ms = self.idle_timeout_ms;
            std::thread::spawn(move || {
                let result = Connection::new(stream, variables).and_then(|mut conn| {
                    conn.set_idle_timeout(idle_timeout_ms)?;
                    conn.handle()
                });
                if let Err(e) = result {
                    tracing::debug!("Connection ended with error: {}", e);
                }
            });
        }

        tracing::info!("Simulated controller on {} stopped", self.local_addr);
        Ok(())
    }

    /// Run the accept loop on a background thread
    pub fn spawn(self) -> Result<SimHandle> {
        let addr = self.local_addr;
        let shutdown = Arc::clone(&self.shutdown);
        let acceptor = std::thread::Builder::new()
            .name("osv-sim-accept".to_string())
            .spawn(move || {
                if let Err(e) = self.run() {
                    tracing::error!("Simulated controller failed: {}", e);
                }
            })?;

        Ok(SimHandle {
            addr,
            shutdown,
            acceptor: Some(acceptor),
        })
    }
}

/// Handle to a simulated controller running in the background
pub struct SimHandle {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    acceptor: Option<JoinHandle<()>>,
}

impl SimHandle {
    /// Address clients should connect to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting and wait for the acceptor thread
    ///
    /// Open client connections keep being served until they close.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(acceptor) = self.acceptor.take() else {
            return;
        };
        self.shutdown.store(true, Ordering::Release);

        // Wake the blocking accept
        let mut wake = self.addr;
        if wake.ip().is_unspecified() {
            wake.set_ip(IpAddr::V4(Ipv4Addr::LOCALHOST));
        }
        let _ = TcpStream::connect(wake);

        if acceptor.join().is_err() {
            tracing::error!("Simulated controller acceptor panicked");
        }
    }
}

impl Drop for SimHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
