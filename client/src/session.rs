//! Mirror session: a client connection plus the state it mirrors

use crate::game::ClientGameState;
use crate::network::{Client, ClientEvent};
use log::{debug, info, warn};
use shared::{Direction, Message};

/// What a poll of the connection produced, for the driver to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorEvent {
    /// The host told us which player we control.
    Welcomed(String),
    /// The host refused to seat us. The connection is closed.
    Rejected(String),
    /// The connection dropped. The match is abandoned.
    Disconnected,
}

#[derive(Debug)]
pub struct MirrorSession {
    endpoint: Client,
    state: ClientGameState,
    local_player_id: Option<String>,
    snapshots_applied: u64,
}

impl MirrorSession {
    /// Connects to `server_addr`. Returns `None` if the attempt fails.
    pub fn join(server_addr: &str) -> Option<Self> {
        let mut endpoint = Client::new(server_addr);
        if !endpoint.connect() {
            return None;
        }

        Some(Self {
            endpoint,
            state: ClientGameState::new(),
            local_player_id: None,
            snapshots_applied: 0,
        })
    }

    pub fn state(&self) -> &ClientGameState {
        &self.state
    }

    /// The player this client steers, once the host has said so.
    pub fn local_player_id(&self) -> Option<&str> {
        self.local_player_id.as_deref()
    }

    pub fn snapshots_applied(&self) -> u64 {
        self.snapshots_applied
    }

    pub fn is_connected(&self) -> bool {
        self.endpoint.is_connected()
    }

    /// Drains every message that has arrived and applies snapshots in order
    ///
    /// Stops at the first disconnection or rejection.
    pub fn poll(&mut self) -> Vec<MirrorEvent> {
        let mut events = Vec::new();

        loop {
            match self.endpoint.receive() {
                ClientEvent::Message(Message::Snapshot(snapshot)) => {
                    self.state.apply_snapshot(&snapshot);
                    self.snapshots_applied += 1;
                }
                ClientEvent::Message(Message::Welcome { player_id }) => {
                    info!("Joined match as {}", player_id);
                    self.local_player_id = Some(player_id.clone());
                    events.push(MirrorEvent::Welcomed(player_id));
                }
                ClientEvent::Message(Message::Rejected { reason }) => {
                    warn!("Host rejected us: {}", reason);
                    self.endpoint.close();
                    events.push(MirrorEvent::Rejected(reason));
                    break;
                }
                ClientEvent::Message(Message::Unknown) => {
                    warn!("Ignoring message of unknown type from host");
                }
                ClientEvent::Message(other) => {
                    warn!("Unexpected {} message from host", other.kind());
                }
                ClientEvent::Idle => break,
                ClientEvent::Disconnected => {
                    info!("Lost connection to {}", self.endpoint.server_addr());
                    events.push(MirrorEvent::Disconnected);
                    break;
                }
            }
        }

        events
    }

    /// Sends a direction change for the local player to the host. Nothing
    /// changes locally until the host's next snapshot.
    pub fn send_direction(&mut self, direction: Direction) -> bool {
        let Some(player_id) = self.local_player_id.clone() else {
            debug!("No player assigned yet, dropping {}", direction);
            return false;
        };
        self.endpoint.send(&Message::input(player_id, direction))
    }

    /// Only the host may restart a match.
    pub fn request_reset(&self) {
        info!("Reset is decided by the host, ignoring");
    }

    pub fn close(&mut self) {
        self.endpoint.close();
    }
}
