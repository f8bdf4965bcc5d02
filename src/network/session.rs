//! Controller Session
//!
//! Owns the TCP connection to one controller and runs strictly one
//! request/response exchange at a time.

use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::Bytes;

use crate::config::Config;
use crate::error::{OsvError, ProtocolError, Result};
use crate::protocol::{
    encode_request, read_response, write_frame, Request, Response, SequenceTracker,
};

/// A connected controller session
///
/// Every exchange takes `&mut self`: one request is in flight at most, and
/// the sequence id only advances on a matching, successful reply. After a
/// timeout or a lost stream the session is broken and must be replaced. Share a
/// session between threads through [`SharedSession`](super::SharedSession).
pub struct Session {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Outgoing sequence id
    tracker: SequenceTracker,

    /// Settings this session was opened with
    config: Config,

    /// Peer address for logging
    peer_addr: String,

    /// Set when the stream can no longer be trusted to line up with requests
    broken: bool,
}

/// Resolve `addr` and connect to the first address that answers
fn open_stream(addr: &str, timeout: Duration) -> std::io::Result<TcpStream> {
    let mut last_err = None;
    for socket_addr in addr.to_socket_addrs()? {
        let attempt = if timeout.is_zero() {
            TcpStream::connect(socket_addr)
        } else {
            TcpStream::connect_timeout(&socket_addr, timeout)
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} did not resolve to any address", addr),
        )
    }))
}

/// Test whether a controller accepts connections, using a throwaway socket
pub fn probe(addr: &str, timeout: Duration) -> bool {
    match open_stream(addr, timeout) {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("Probe of {} failed: {}", addr, e);
            false
        }
    }
}

impl Session {
    /// Connect with default settings
    pub fn connect(ip: &str, port: u16) -> Result<Self> {
        let config = Config::builder().host(ip).port(port).build();
        Self::connect_with(config)
    }

    /// Connect using the given config
    ///
    /// Sets up buffered I/O and configures timeouts
    pub fn connect_with(config: Config) -> Result<Self> {
        let addr = config.addr();
        let stream = open_stream(&addr, config.connect_timeout()).map_err(|source| {
            OsvError::Connect {
                addr: addr.clone(),
                source,
            }
        })?;

        // Disable Nagle's algorithm; frames are small and latency-bound
        stream.set_nodelay(true)?;
        stream.set_read_timeout(config.read_timeout())?;
        stream.set_write_timeout(config.write_timeout())?;

        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| addr.clone());

        let tracker = match config.initial_sequence_id {
            Some(id) => SequenceTracker::starting_at(id),
            None => SequenceTracker::random(),
        };

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;

        tracing::info!(
            "Connected to controller at {} (sequence id {})",
            peer_addr,
            tracker.next_id()
        );

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            tracker,
            config,
            peer_addr,
            broken: false,
        })
    }

    /// Check liveness over a separate connection.
    ///
    /// The session's own socket and sequence id are left alone.
    pub fn is_reachable(&self) -> bool {
        probe(&self.config.addr(), self.config.connect_timeout())
    }

    /// Read a variable
    pub fn read(&mut self, name: &str) -> Result<Bytes> {
        let name = self.config.text_encoding.encode("variable name", name)?;
        self.exchange(Request::read(name))
    }

    /// Read a variable and decode it under the configured text policy
    pub fn read_text(&mut self, name: &str) -> Result<String> {
        let value = self.read(name)?;
        self.config.text_encoding.decode(&value)
    }

    /// Write a variable
    ///
    /// Returns the value the controller echoes, which may differ from `value`
    /// when the controller clamps or reformats it.
    pub fn write(&mut self, name: &str, value: &str) -> Result<Bytes> {
        let encoding = self.config.text_encoding;
        let name = encoding.encode("variable name", name)?;
        let value = encoding.encode("variable value", value)?;
        self.exchange(Request::write(name, value))
    }

    /// Read the configured heartbeat variable and discard the value
    pub fn keep_alive(&mut self) -> Result<()> {
        let var = self.config.heartbeat_var.clone();
        self.keep_alive_var(&var)
    }

    /// Keep-alive against a specific variable
    pub fn keep_alive_var(&mut self, name: &str) -> Result<()> {
        self.read(name).map(|_| ())
    }

    /// Send one request and wait for its reply
    fn exchange(&mut self, request: Request) -> Result<Bytes> {
        if self.broken {
            return Err(OsvError::SessionBroken);
        }

        let sequence_id = self.tracker.next_id();
        let frame = encode_request(sequence_id, &request)?;

        tracing::debug!(
            "Sending {:?} #{} for {} to {}",
            request.flag(),
            sequence_id,
            String::from_utf8_lossy(request.name()),
            self.peer_addr
        );

        let response = match self.transfer(&frame) {
            Ok(response) => response,
            Err(e) => {
                if e.breaks_session() {
                    self.mark_broken(&e);
                }
                return Err(e);
            }
        };
        tracing::debug!(
            "Reply #{} from {}: {} value bytes, status {:02x?}",
            response.sequence_id,
            self.peer_addr,
            response.value.len(),
            response.status
        );

        if self.tracker.confirm(response.sequence_id, response.is_success()) {
            return Ok(response.value);
        }

        if response.sequence_id != sequence_id {
            Err(ProtocolError::SequenceMismatch {
                expected: sequence_id,
                received: response.sequence_id,
            }
            .into())
        } else {
            Err(ProtocolError::ControllerRejected {
                sequence_id,
                status: response.status,
            }
            .into())
        }
    }

    fn transfer(&mut self, frame: &[u8]) -> Result<Response> {
        write_frame(&mut self.writer, frame)?;
        read_response(&mut self.reader)
    }

    /// A late or partial reply may still arrive on this stream, so no
    /// further request may be matched against it.
    fn mark_broken(&mut self, cause: &OsvError) {
        tracing::warn!(
            "Session to {} unusable after failure: {}",
            self.peer_addr,
            cause
        );
        self.broken = true;
        let _ = self.reader.get_ref().shutdown(Shutdown::Both);
    }

    /// Shut the socket down in both directions
    pub(crate) fn shutdown(&mut self) -> Result<()> {
        // Nothing is buffered between exchanges; a failed flush only means
        // the peer is already gone.
        let _ = std::io::Write::flush(&mut self.writer);
        match self.reader.get_ref().shutdown(Shutdown::Both) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => {}
            Err(e) => return Err(e.into()),
        }
        tracing::info!("Disconnected from {}", self.peer_addr);
        Ok(())
    }

    /// Close the connection
    ///
    /// Dropping a session also releases the socket.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// True once a timeout, stream failure or framing error has made the
    /// session unusable; every later exchange fails with `SessionBroken`.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// The id the next request will carry
    pub fn sequence_id(&self) -> u16 {
        self.tracker.next_id()
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
