//! Client network layer: one TCP connection to the host

use log::{debug, info, warn};
use shared::connection::{FramedStream, LinkError};
use shared::framing::FrameConfig;
use shared::Message;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// How long a single connection attempt may take.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one non-blocking receive.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Message(Message),
    /// Nothing complete has arrived yet.
    Idle,
    /// The connection is gone; every later receive reports this too.
    Disconnected,
}

/// Connecting side of a match
#[derive(Debug)]
pub struct Client {
    server_addr: String,
    link: Option<FramedStream>,
    frame_config: FrameConfig,
}

impl Client {
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            link: None,
            frame_config: FrameConfig::default(),
        }
    }

    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// Makes one blocking connection attempt, then switches the socket to
    /// non-blocking mode. Returns false on any failure; nothing is retried.
    pub fn connect(&mut self) -> bool {
        let addr = match self.server_addr.to_socket_addrs() {
            Ok(mut addrs) => match addrs.next() {
                Some(addr) => addr,
                None => {
                    warn!("{} did not resolve to any address", self.server_addr);
                    return false;
                }
            },
            Err(e) => {
                warn!("Invalid server address {}: {}", self.server_addr, e);
                return false;
            }
        };

        let stream = match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to connect to {}: {}", addr, e);
                return false;
            }
        };

        match FramedStream::new(stream, self.frame_config.clone()) {
            Ok(link) => {
                info!("Connected to {}", addr);
                self.link = Some(link);
                true
            }
            Err(e) => {
                warn!("Failed to configure connection to {}: {}", addr, e);
                false
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Sends one message. A failure marks the client disconnected.
    pub fn send(&mut self, message: &Message) -> bool {
        let Some(link) = self.link.as_mut() else {
            debug!("Not connected, dropping {}", message.kind());
            return false;
        };

        match link.send(message) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send {}: {}", message.kind(), e);
                self.close();
                false
            }
        }
    }

    /// Returns at most one message without blocking.
    pub fn receive(&mut self) -> ClientEvent {
        let Some(link) = self.link.as_mut() else {
            return ClientEvent::Disconnected;
        };

        match link.poll_message::<Message>() {
            Ok(Some(message)) => ClientEvent::Message(message),
            Ok(None) => ClientEvent::Idle,
            Err(LinkError::Closed) => {
                info!("Server closed the connection");
                self.close();
                ClientEvent::Disconnected
            }
            Err(e) => {
                warn!("Connection to {} failed: {}", self.server_addr, e);
                self.close();
                ClientEvent::Disconnected
            }
        }
    }

    /// Closes the socket. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut link) = self.link.take() {
            debug!("Closing connection to {}", link.peer_addr());
            link.shutdown();
        }
    }
}
