//! Connection Handler Module
//!
//! This module handles individual client connections to KVStor.
//! Each client gets its own handler task that runs in a loop,
//! reading lines and sending one response line per request line.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects
//!        │
//!        ▼
//! 2. ConnectionHandler spawned
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │  Read bytes from socket      │
//!    │  Split off complete lines    │
//!    │  Execute each line in order  │
//!    │  Write + flush its response  │
//!    │         [Loop back]          │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. Client disconnects / I/O error
//!        │
//!        ▼
//! 5. Handler task ends
//! ```
//!
//! ## Buffer Management
//!
//! Incoming bytes accumulate in a `BytesMut`. TCP is a stream, so one read may
//! hold half a line or several lines. A line of [`MAX_LINE_LENGTH`] bytes or
//! more closes the connection, whether or not its newline has arrived yet.
//!
//! Errors never leave the connection's own task: a failed read or write ends
//! this connection and nothing else.

use crate::commands::CommandHandler;
use crate::protocol::ResponseStyle;
use bytes::{Bytes, BytesMut};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, error, info, trace, warn};

/// Request lines must be shorter than this (64 KB), terminator excluded
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total request lines processed
    pub commands_processed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles a single client connection.
///
/// Generic over the stream so anything `AsyncRead + AsyncWrite` can be
/// served; the server uses `TcpStream`.
pub struct ConnectionHandler<S> {
    stream: BufWriter<S>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Bytes read but not yet consumed as complete lines
    buffer: BytesMut,

    /// Prefix of `buffer` already searched for a newline
    scanned: usize,

    command_handler: CommandHandler,

    style: ResponseStyle,

    stats: Arc<ConnectionStats>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The client stream
    /// * `addr` - The client's socket address
    /// * `command_handler` - Executes request lines against the shared store
    /// * `style` - How response lines are rendered
    /// * `stats` - Shared connection statistics
    pub fn new(
        stream: S,
        addr: SocketAddr,
        command_handler: CommandHandler,
        style: ResponseStyle,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            scanned: 0,
            command_handler,
            style,
            stats,
        }
    }

    /// Runs the connection loop until the client disconnects or an I/O
    /// error occurs.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected gracefully"),
            Err(e) => match e {
                ConnectionError::IoError(io_err)
                    if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
                {
                    debug!(client = %self.addr, "Connection reset by client")
                }
                _ => warn!(client = %self.addr, error = %e, "Connection error"),
            },
        }

        self.stats.connection_closed();
        result
    }

    /// The main read-execute-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(line) = self.next_line()? {
                self.process_line(&line).await?;
            }

            if self.read_more_data().await? == 0 {
                // An unterminated final line still counts as a request
                if !self.buffer.is_empty() {
                    self.scanned = 0;
                    let line = strip_cr(self.buffer.split().freeze());
                    self.process_line(&line).await?;
                }
                return Ok(());
            }
        }
    }

    /// Splits the next complete line off the buffer, without its terminator.
    ///
    /// The search resumes where the previous one stopped, so a line that
    /// arrives in many small reads is scanned once.
    fn next_line(&mut self) -> Result<Option<Bytes>, ConnectionError> {
        let pos = match self.buffer[self.scanned..]
            .iter()
            .position(|&b| b == b'\n')
        {
            Some(offset) => self.scanned + offset,
            None => {
                self.scanned = self.buffer.len();
                return Ok(None);
            }
        };

        // One read may carry an over-long line together with its newline
        if pos >= MAX_LINE_LENGTH {
            error!(client = %self.addr, size = pos, "Request line too long");
            return Err(ConnectionError::LineTooLong);
        }

        self.scanned = 0;
        let mut line = self.buffer.split_to(pos + 1);
        line.truncate(pos);
        trace!(
            client = %self.addr,
            len = pos,
            remaining = self.buffer.len(),
            "Split request line"
        );

        Ok(Some(strip_cr(line.freeze())))
    }

    /// Executes one request line and writes its response.
    async fn process_line(&mut self, line: &[u8]) -> Result<(), ConnectionError> {
        let response = self.command_handler.execute_line(line);
        self.stats.command_processed();

        let bytes = response.serialize(self.style);
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(bytes.len());
        trace!(
            client = %self.addr,
            bytes = bytes.len(),
            "Sent response"
        );
        Ok(())
    }

    /// Reads more data from the stream into the buffer.
    ///
    /// Returns the number of bytes read; 0 means the peer closed.
    async fn read_more_data(&mut self) -> Result<usize, ConnectionError> {
        if self.buffer.len() >= MAX_LINE_LENGTH {
            error!(
                client = %self.addr,
                size = self.buffer.len(),
                "Request line too long"
            );
            return Err(ConnectionError::LineTooLong);
        }

        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n > 0 {
            self.stats.bytes_read(n);
            trace!(client = %self.addr, bytes = n, "Read data");
        }

        Ok(n)
    }
}

fn strip_cr(mut line: Bytes) -> Bytes {
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    line
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error while reading a request or writing a response
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A request line exceeded the maximum length
    #[error("Request line exceeds {} bytes", MAX_LINE_LENGTH)]
    LineTooLong,
}

/// Handles a client connection.
///
/// Creates a [`ConnectionHandler`] and runs it to completion. Errors are
/// logged and stay within this connection.
pub async fn handle_connection<S>(
    stream: S,
    addr: SocketAddr,
    command_handler: CommandHandler,
    style: ResponseStyle,
    stats: Arc<ConnectionStats>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let handler = ConnectionHandler::new(stream, addr, command_handler, style, stats);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::IoError(ref io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "Connection ended with error");
            }
        }
    }
}
