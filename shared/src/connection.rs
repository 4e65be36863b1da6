//! Non-blocking framed TCP stream used by both endpoint roles.
//!
//! Reads and writes never suspend: a read that finds nothing returns
//! `Ok(None)`, and bytes the kernel cannot take yet stay in an outbound
//! buffer until the next send or flush. Any error, including the peer
//! closing its side, surfaces as a [`LinkError`] that the owning endpoint
//! turns into a disconnection.

use crate::framing::{encode, FrameBuffer, FrameConfig, FrameError, HEADER_LEN};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

const READ_CHUNK: usize = 4096;

/// Upper bound on bytes queued for a peer that is not reading.
pub const MAX_OUTBOUND_BYTES: usize = 4 * 1_048_576;

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("connection closed by peer")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("framing error: {0}")]
    Frame(#[from] FrameError),

    #[error("outbound backlog of {0} bytes exceeds limit")]
    Backlog(usize),
}

/// A TCP stream in non-blocking mode with per-connection frame buffers.
#[derive(Debug)]
pub struct FramedStream {
    stream: TcpStream,
    peer_addr: SocketAddr,
    frame_config: FrameConfig,
    inbound: FrameBuffer,
    outbound: Vec<u8>,
    eof: bool,
}

impl FramedStream {
    /// Switches `stream` to non-blocking mode and wraps it.
    pub fn new(stream: TcpStream, frame_config: FrameConfig) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr()?;

        Ok(Self {
            stream,
            peer_addr,
            inbound: FrameBuffer::new(frame_config.clone()),
            frame_config,
            outbound: Vec::new(),
            eof: false,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Frames and queues `message`, then writes as much as the socket accepts.
    pub fn send<T: Serialize + ?Sized>(&mut self, message: &T) -> Result<(), LinkError> {
        let frame = encode(message, &self.frame_config)?;
        self.send_frame(&frame)
    }

    /// Queues an already encoded frame. Used to encode a broadcast once.
    pub fn send_frame(&mut self, frame: &[u8]) -> Result<(), LinkError> {
        self.outbound.extend_from_slice(frame);
        self.flush()
    }

    /// Writes queued bytes until the socket would block.
    pub fn flush(&mut self) -> Result<(), LinkError> {
        while !self.outbound.is_empty() {
            match self.stream.write(&self.outbound) {
                Ok(0) => return Err(LinkError::Closed),
                Ok(n) => {
                    self.outbound.drain(..n);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if self.outbound.len() > MAX_OUTBOUND_BYTES {
            return Err(LinkError::Backlog(self.outbound.len()));
        }
        if !self.outbound.is_empty() {
            debug!(
                "{} bytes still queued for {}",
                self.outbound.len(),
                self.peer_addr
            );
        }
        Ok(())
    }

    /// Returns at most one complete message.
    ///
    /// `Ok(None)` means nothing complete has arrived yet. Messages that were
    /// fully received before the peer closed are still delivered; the close
    /// is reported once the buffer runs dry.
    pub fn poll_message<T: DeserializeOwned>(&mut self) -> Result<Option<T>, LinkError> {
        if let Some(message) = self.inbound.next_message()? {
            return Ok(Some(message));
        }

        self.fill()?;

        match self.inbound.next_message()? {
            Some(message) => Ok(Some(message)),
            None if self.eof => Err(LinkError::Closed),
            None => Ok(None),
        }
    }

    pub fn queued_outbound(&self) -> usize {
        self.outbound.len()
    }

    /// Closes both directions. Errors are ignored; the socket is going away.
    pub fn shutdown(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    /// Largest inbound backlog worth reading ahead. A buffer this long always
    /// holds a complete frame, so reading stops until it is consumed.
    fn inbound_limit(&self) -> usize {
        HEADER_LEN + self.frame_config.max_payload_size as usize
    }

    fn fill(&mut self) -> Result<(), LinkError> {
        let limit = self.inbound_limit();
        let mut chunk = [0u8; READ_CHUNK];
        while !self.eof && self.inbound.len() < limit {
            match self.stream.read(&mut chunk) {
                Ok(0) => self.eof = true,
                Ok(n) => self.inbound.extend(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
