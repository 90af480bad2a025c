//! TCP link to the telemetry peer.
//!
//! Implements [`TelemetryPort`] and [`CommandPort`] over a single
//! client `TcpStream` (lwIP sockets through `std::net` on ESP-IDF, the
//! host stack otherwise).
//!
//! ## Connection model
//!
//! 1. `connect()` opens the stream to the configured `host:port` and puts
//!    it in non-blocking mode.
//! 2. Each successful `read()` is treated as one command message; the
//!    peer sends one JSON object per write.
//! 3. A write error, a read error other than `WouldBlock`, or EOF tears
//!    the stream down.  Further sends report `ConnectionClosed` until
//!    `connect()` is called again.
//! 4. A send that cannot finish within the send budget (the peer stopped
//!    reading and the socket buffer is full) counts as a write error.
//!    A send never holds the caller longer than that budget.

use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::app::ports::{CommandPort, TelemetryPort};
use crate::error::CommsError;

/// Longest a single telemetry send may keep retrying a full socket.
pub const DEFAULT_SEND_BUDGET: Duration = Duration::from_millis(20);

pub struct TcpLink {
    addr: heapless::String<{ crate::config::SERVER_ADDR_CAP }>,
    stream: Option<TcpStream>,
    send_budget: Duration,
}

impl TcpLink {
    pub fn new(addr: &str) -> Result<Self, CommsError> {
        Ok(Self {
            addr: addr.try_into().map_err(|_| CommsError::ConnectFailed)?,
            stream: None,
            send_budget: DEFAULT_SEND_BUDGET,
        })
    }

    pub fn with_send_budget(mut self, budget: Duration) -> Self {
        self.send_budget = budget;
        self
    }

    /// Open (or reopen) the connection.
    pub fn connect(&mut self) -> Result<(), CommsError> {
        self.stream = None;
        let stream = TcpStream::connect(self.addr.as_str()).map_err(|e| {
            warn!("link: connect to {} failed: {}", self.addr, e);
            CommsError::ConnectFailed
        })?;
        stream
            .set_nonblocking(true)
            .map_err(|_| CommsError::ConnectFailed)?;
        // Telemetry frames are small; send them as soon as they are written.
        if let Err(e) = stream.set_nodelay(true) {
            warn!("link: TCP_NODELAY not applied: {}", e);
        }
        info!("link: connected to {}", self.addr);
        self.stream = Some(stream);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            info!("link: disconnected from {}", self.addr);
        }
    }
}

impl TelemetryPort for TcpLink {
    fn send(&mut self, payload: &str) -> Result<(), CommsError> {
        let stream = self.stream.as_mut().ok_or(CommsError::ConnectionClosed)?;
        let started = Instant::now();
        let mut remaining = payload.as_bytes();
        while !remaining.is_empty() {
            match stream.write(remaining) {
                Ok(0) => {
                    self.stream = None;
                    return Err(CommsError::ConnectionClosed);
                }
                Ok(n) => remaining = &remaining[n..],
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    if started.elapsed() >= self.send_budget {
                        warn!(
                            "link: peer not reading, {} of {} bytes unsent after {:?}",
                            remaining.len(),
                            payload.len(),
                            self.send_budget
                        );
                        self.stream = None;
                        return Err(CommsError::SendFailed);
                    }
                    std::thread::yield_now();
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(_) => {
                    self.stream = None;
                    return Err(CommsError::SendFailed);
                }
            }
        }
        Ok(())
    }
}

impl CommandPort for TcpLink {
    fn poll(&mut self, buf: &mut [u8]) -> Result<Option<usize>, CommsError> {
        let stream = self.stream.as_mut().ok_or(CommsError::ConnectionClosed)?;
        match stream.read(buf) {
            Ok(0) => {
                self.stream = None;
                Err(CommsError::ConnectionClosed)
            }
            Ok(n) => Ok(Some(n)),
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(ref e) if e.kind() == ErrorKind::Interrupted => Ok(None),
            Err(_) => {
                self.stream = None;
                Err(CommsError::ReceiveFailed)
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests (host path only)
// ───────────────────────────────────────────────────────────────
