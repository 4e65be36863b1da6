//! Server network layer: TCP listener, peer streams and snapshot fan-out

use crate::client_manager::{ClientManager, PeerId};
use log::{debug, error, info, warn};
use shared::connection::{FramedStream, LinkError};
use shared::framing::{encode, FrameConfig};
use shared::Message;
use std::io::{self, ErrorKind};
use std::net::{SocketAddr, TcpListener};

pub const DEFAULT_PORT: u16 = 5555;

/// Reason sent to connections arriving after the roster is full.
pub const MATCH_FULL_REASON: &str = "match is full";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Remote players admitted besides the host.
    pub max_peers: usize,
    pub frame: FrameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_peers: 1,
            frame: FrameConfig::default(),
        }
    }
}

/// Accepting side of a match
///
/// Every operation returns immediately. Accepting, receiving and sending are
/// driven by the owner once per tick; a peer whose stream fails at any of
/// those steps is removed and later reported by [`Server::take_departed`].
#[derive(Debug)]
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    clients: ClientManager,
    frame_config: FrameConfig,
}

impl Server {
    /// Binds the listener and switches it to non-blocking mode.
    pub fn bind(config: ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.bind_addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        info!(
            "Server listening on {} (up to {} peers)",
            local_addr, config.max_peers
        );

        Ok(Self {
            listener: Some(listener),
            local_addr,
            clients: ClientManager::new(config.max_peers),
            frame_config: config.frame,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts every connection waiting in the backlog
    ///
    /// Returns the ids of newly seated peers. Connections beyond capacity get
    /// a `rejected` message and are closed straight away.
    pub fn accept_pending(&mut self) -> Vec<PeerId> {
        let mut accepted = Vec::new();
        let Some(listener) = &self.listener else {
            return accepted;
        };

        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    let link = match FramedStream::new(stream, self.frame_config.clone()) {
                        Ok(link) => link,
                        Err(e) => {
                            warn!("Failed to set up connection from {}: {}", addr, e);
                            continue;
                        }
                    };

                    match self.clients.add_peer(link) {
                        Ok(id) => accepted.push(id),
                        Err(link) => {
                            info!(
                                "Turning away {}, all {} slots are taken",
                                addr,
                                self.clients.max_peers()
                            );
                            Self::reject(link, MATCH_FULL_REASON)
                        }
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    break;
                }
            }
        }

        accepted
    }

    /// Reads at most one message from each peer
    ///
    /// Peers whose stream closed or produced a malformed frame are removed.
    pub fn receive_pending(&mut self) -> Vec<(PeerId, Message)> {
        let mut received = Vec::new();
        let mut broken = Vec::new();

        for peer in self.clients.peers_mut() {
            match peer.link.poll_message::<Message>() {
                Ok(Some(message)) => {
                    debug!("Received {} from {}", message.kind(), peer.id);
                    received.push((peer.id, message));
                }
                Ok(None) => {}
                Err(LinkError::Closed) => {
                    info!("{} closed the connection", peer.id);
                    broken.push(peer.id);
                }
                Err(e) => {
                    warn!("Dropping {} after receive error: {}", peer.id, e);
                    broken.push(peer.id);
                }
            }
        }

        for id in broken {
            self.clients.remove_peer(id);
        }
        received
    }

    /// Sends `message` to every peer, best effort
    ///
    /// The message is encoded once. A peer that cannot take it is removed;
    /// the others still receive it.
    pub fn broadcast(&mut self, message: &Message) {
        if self.clients.is_empty() {
            return;
        }

        let frame = match encode(message, &self.frame_config) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to encode {} for broadcast: {}", message.kind(), e);
                return;
            }
        };

        let mut failed = Vec::new();
        for peer in self.clients.peers_mut() {
            if let Err(e) = peer.link.send_frame(&frame) {
                warn!("Failed to send {} to {}: {}", message.kind(), peer.id, e);
                failed.push(peer.id);
            }
        }

        for id in failed {
            self.clients.remove_peer(id);
        }
    }

    /// Sends to a single peer. Returns false if the peer is unknown or the
    /// send failed, in which case the peer has been removed.
    pub fn send_to(&mut self, id: PeerId, message: &Message) -> bool {
        let Some(peer) = self.clients.get_mut(id) else {
            debug!("Not sending {} to unknown {}", message.kind(), id);
            return false;
        };

        match peer.link.send(message) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send {} to {}: {}", message.kind(), id, e);
                self.clients.remove_peer(id);
                false
            }
        }
    }

    /// Peers removed since the last call, for the session to clean up after.
    pub fn take_departed(&mut self) -> Vec<PeerId> {
        self.clients.take_departed()
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.clients.peer_ids()
    }

    pub fn peer_count(&self) -> usize {
        self.clients.len()
    }

    pub fn is_full(&self) -> bool {
        self.clients.is_full()
    }

    pub fn is_closed(&self) -> bool {
        self.listener.is_none()
    }

    /// Stops listening and closes every peer. Safe to call more than once.
    pub fn close(&mut self) {
        if self.listener.take().is_some() {
            info!("Shutting down server on {}", self.local_addr);
        }
        self.clients.close_all();
    }

    fn reject(mut link: FramedStream, reason: &str) {
        info!("Rejecting {}: {}", link.peer_addr(), reason);
        let rejected = Message::Rejected {
            reason: reason.to_string(),
        };
        if let Err(e) = link.send(&rejected) {
            debug!("Could not tell {} it was rejected: {}", link.peer_addr(), e);
        }
        link.shutdown();
    }
}
