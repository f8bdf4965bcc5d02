//! Connection Handler
//!
//! Serves one client connection on the simulated controller.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use super::VariableTable;
use crate::error::{OsvError, Result};
use crate::protocol::{encode_response, read_request, write_frame, Request};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Variables served by this controller
    variables: Arc<VariableTable>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, variables: Arc<VariableTable>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            variables,
            peer_addr,
        })
    }

    /// Configure an idle timeout; 0 leaves reads blocking
    pub fn set_idle_timeout(&mut self, ms: u64) -> Result<()> {
        if ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads requests in a loop and answers each one.
    /// Returns when the client disconnects, idles out, or sends garbage.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let (sequence_id, request) = match read_request(&mut self.reader) {
                Ok(decoded) => decoded,
                Err(OsvError::ConnectionClosed) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(OsvError::Timeout) => {
                    tracing::debug!("Idle timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    // No error reply exists in the protocol; drop the client
                    tracing::warn!("Bad request from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            tracing::trace!("Request #{} from {}: {:?}", sequence_id, self.peer_addr, request);

            if let Err(e) = self.answer(sequence_id, &request) {
                if let OsvError::Io(ref io_err) = e {
                    match io_err.kind() {
                        std::io::ErrorKind::ConnectionAborted
                        | std::io::ErrorKind::ConnectionReset
                        | std::io::ErrorKind::BrokenPipe => {
                            tracing::debug!(
                                "Client {} disconnected before reply could be sent: {}",
                                self.peer_addr,
                                e
                            );
                            return Ok(());
                        }
                        _ => {}
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Apply a request to the table and send the reply
    fn answer(&mut self, sequence_id: u16, request: &Request) -> Result<()> {
        let (flag, value, status) = self.variables.apply(request);
        let frame = encode_response(sequence_id, flag as u8, &value, status)?;
        write_frame(&mut self.writer, &frame)
    }
}
