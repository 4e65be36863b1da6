//! Connected peer roster for the server endpoint
//!
//! This module tracks the server side of every accepted connection:
//! - Peer identity (a monotonically increasing session id, never reused)
//! - The framed non-blocking stream used to talk to the peer
//! - Capacity enforcement for the configured peer limit
//! - A record of peers removed since the last poll, so the session layer can
//!   react to disconnections it never got a notification for
//!
//! Peer ids are transport-level handles. Mapping them to game player ids is
//! the session coordinator's job.

use log::info;
use shared::connection::FramedStream;
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Opaque per-connection identifier assigned by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Represents an accepted connection and its stream state
#[derive(Debug)]
pub struct Peer {
    /// Unique peer identifier assigned by the server
    pub id: PeerId,
    /// Framed stream with this peer's inbound and outbound buffers
    pub link: FramedStream,
    /// When the connection was accepted
    pub connected_at: Instant,
}

impl Peer {
    pub fn new(id: PeerId, link: FramedStream) -> Self {
        Self {
            id,
            link,
            connected_at: Instant::now(),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.link.peer_addr()
    }

    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

/// Manages all connected peers
///
/// Peers are kept ordered by id, which is also accept order, so broadcast
/// and receive visit them deterministically.
#[derive(Debug)]
pub struct ClientManager {
    /// Connected peers indexed by their id
    peers: BTreeMap<PeerId, Peer>,
    /// Next id handed out; ids are never reused within a server's lifetime
    next_peer_id: u64,
    /// Maximum number of concurrent peers allowed
    max_peers: usize,
    /// Peers removed since the last call to `take_departed`
    departed: Vec<PeerId>,
}

impl ClientManager {
    /// Creates an empty roster with the given capacity limit. Ids start at 1.
    pub fn new(max_peers: usize) -> Self {
        Self {
            peers: BTreeMap::new(),
            next_peer_id: 1,
            max_peers,
            departed: Vec::new(),
        }
    }

    /// Attempts to seat a new connection
    ///
    /// Returns `Err(link)` untouched when the roster is at capacity so the
    /// caller can tell the peer why before closing it.
    pub fn add_peer(&mut self, link: FramedStream) -> Result<PeerId, FramedStream> {
        if self.is_full() {
            return Err(link);
        }

        let id = PeerId(self.next_peer_id);
        self.next_peer_id += 1;

        info!("Peer {} connected from {}", id, link.peer_addr());
        self.peers.insert(id, Peer::new(id, link));
        Ok(id)
    }

    /// Removes a peer and closes its socket
    ///
    /// Returns false if the peer was already gone. Removed peers are
    /// reported once through `take_departed`.
    pub fn remove_peer(&mut self, id: PeerId) -> bool {
        match self.peers.remove(&id) {
            Some(mut peer) => {
                peer.link.shutdown();
                info!(
                    "Peer {} ({}) removed after {:.1}s",
                    id,
                    peer.addr(),
                    peer.connected_for().as_secs_f32()
                );
                self.departed.push(id);
                true
            }
            None => false,
        }
    }

    pub fn get_mut(&mut self, id: PeerId) -> Option<&mut Peer> {
        self.peers.get_mut(&id)
    }

    pub fn peers_mut(&mut self) -> impl Iterator<Item = &mut Peer> {
        self.peers.values_mut()
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.keys().copied().collect()
    }

    /// Drains the list of peers removed since the previous call.
    pub fn take_departed(&mut self) -> Vec<PeerId> {
        std::mem::take(&mut self.departed)
    }

    /// Closes every peer socket without reporting them as departed.
    pub fn close_all(&mut self) {
        for (id, mut peer) in std::mem::take(&mut self.peers) {
            info!("Closing connection to {} ({})", id, peer.addr());
            peer.link.shutdown();
        }
        self.departed.clear();
    }

    pub fn is_full(&self) -> bool {
        self.peers.len() >= self.max_peers
    }

    pub fn max_peers(&self) -> usize {
        self.max_peers
    }

    /// Returns the number of currently connected peers
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::framing::FrameConfig;
    use std::net::{TcpListener, TcpStream};

    /// Returns the server-side link plus the raw client socket keeping it alive
    fn link() -> (FramedStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (accepted, _) = listener.accept().unwrap();
        (
            FramedStream::new(accepted, FrameConfig::default()).unwrap(),
            client,
        )
    }

    #[test]
    fn test_manager_creation() {
        let manager = ClientManager::new(4);
        assert_eq!(manager.len(), 0);
        assert!(manager.is_empty());
        assert_eq!(manager.max_peers(), 4);
        assert!(!manager.is_full());
    }

    #[test]
    fn test_ids_increase_and_are_not_reused() {
        let mut manager = ClientManager::new(2);
        let (first_link, _a) = link();
        let (second_link, _b) = link();

        let first = manager.add_peer(first_link).unwrap();
        assert_eq!(first, PeerId(1));
        assert!(manager.remove_peer(first));

        let second = manager.add_peer(second_link).unwrap();
        assert_eq!(second, PeerId(2));
    }

    #[test]
    fn test_capacity_limit() {
        let mut manager = ClientManager::new(1);
        let (first_link, _a) = link();
        let (second_link, _b) = link();

        assert!(manager.add_peer(first_link).is_ok());
        assert!(manager.is_full());
        assert!(manager.add_peer(second_link).is_err());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_departed_reported_once() {
        let mut manager = ClientManager::new(2);
        let (peer_link, _client) = link();
        let id = manager.add_peer(peer_link).unwrap();

        assert!(manager.remove_peer(id));
        assert!(!manager.remove_peer(id));
        assert_eq!(manager.take_departed(), vec![id]);
        assert!(manager.take_departed().is_empty());
    }

    #[test]
    fn test_close_all_is_not_a_departure() {
        let mut manager = ClientManager::new(2);
        let (peer_link, _client) = link();
        manager.add_peer(peer_link).unwrap();

        manager.close_all();
        assert!(manager.is_empty());
        assert!(manager.take_departed().is_empty());
    }

    #[test]
    fn test_peer_id_display() {
        assert_eq!(PeerId(7).to_string(), "peer-7");
    }
}
