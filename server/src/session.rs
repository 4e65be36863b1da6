//! Authoritative session: one match plus, when hosting, its network endpoint
//!
//! A [`HostSession`] is what single-player and host roles run every tick.
//! With no endpoint it is a plain local simulation. With an endpoint it also
//! seats joiners, applies their inputs and broadcasts a snapshot after each
//! simulation step.

use crate::client_manager::PeerId;
use crate::game::{GameState, InputResult};
use crate::network::{Server, ServerConfig};
use log::{debug, info, warn};
use shared::{
    player_id_for_slot, ConfigError, Direction, GameConfig, MatchView, Message, Role,
    HOST_PLAYER_ID,
};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;

/// Things the driver may want to show or react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PlayerJoined(String),
    PlayerLeft(String),
    GameOver,
}

#[derive(Debug)]
pub struct HostSession {
    role: Role,
    game: GameState,
    endpoint: Option<Server>,
    /// Which remote player each connected peer controls.
    peer_players: HashMap<PeerId, String>,
    /// Set once the game-over snapshot went out; cleared by reset.
    final_state_sent: bool,
}

impl HostSession {
    /// A local match with only the host's snake and no networking.
    pub fn single_player(config: GameConfig) -> Result<Self, ConfigError> {
        let game = GameState::new(config, &[HOST_PLAYER_ID])?;
        info!("Starting single-player match");
        Ok(Self {
            role: Role::SinglePlayer,
            game,
            endpoint: None,
            peer_players: HashMap::new(),
            final_state_sent: false,
        })
    }

    /// Binds the listener and starts a match holding only the host's snake
    ///
    /// An unplayable `config` is reported as [`io::ErrorKind::InvalidInput`]
    /// before anything is bound.
    pub fn host(config: GameConfig, server_config: ServerConfig) -> io::Result<Self> {
        let game = GameState::new(config, &[HOST_PLAYER_ID])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let endpoint = Server::bind(server_config)?;
        Ok(Self {
            role: Role::Server,
            game,
            endpoint: Some(endpoint),
            peer_players: HashMap::new(),
            final_state_sent: false,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn local_player_id(&self) -> &str {
        HOST_PLAYER_ID
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut GameState {
        &mut self.game
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.endpoint.as_ref().map(Server::local_addr)
    }

    pub fn peer_count(&self) -> usize {
        self.endpoint.as_ref().map_or(0, Server::peer_count)
    }

    /// True once every remote slot is taken. Single-player is always full.
    pub fn is_full(&self) -> bool {
        self.endpoint.as_ref().map_or(true, Server::is_full)
    }

    /// Seats pending connections and drops players whose peers went away.
    pub fn accept_joins(&mut self) -> Vec<SessionEvent> {
        let mut events = self.drop_departed();
        let Some(endpoint) = self.endpoint.as_mut() else {
            return events;
        };

        for peer in endpoint.accept_pending() {
            let player_id = next_free_player_id(&self.game);

            self.game.add_player(&player_id);
            self.peer_players.insert(peer, player_id.clone());
            info!("{} joined as {}", peer, player_id);

            let welcome = Message::Welcome {
                player_id: player_id.clone(),
            };
            if endpoint.send_to(peer, &welcome) {
                endpoint.send_to(peer, &Message::Snapshot(self.game.snapshot()));
            }
            events.push(SessionEvent::PlayerJoined(player_id));
        }

        events.extend(self.drop_departed());
        events
    }

    /// Applies a direction change for the local player.
    pub fn handle_local_input(&mut self, direction: Direction) {
        self.game.apply_input(HOST_PLAYER_ID, direction);
    }

    /// Restarts the match with the same roster. The next tick broadcasts it.
    pub fn reset(&mut self) {
        self.game.reset();
        self.final_state_sent = false;
    }

    /// One authoritative step: seat joiners, apply remote inputs, simulate,
    /// then broadcast
    ///
    /// Once the match is over the final snapshot is broadcast exactly once;
    /// later ticks send nothing until a reset.
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        let mut events = self.accept_joins();
        self.apply_remote_inputs();
        events.extend(self.drop_departed());

        if !self.game.is_game_over() {
            let report = self.game.update();
            if report.game_over.is_some() {
                events.push(SessionEvent::GameOver);
            }
        }

        if let Some(endpoint) = self.endpoint.as_mut() {
            let over = self.game.is_game_over();
            if !over || !self.final_state_sent {
                endpoint.broadcast(&Message::Snapshot(self.game.snapshot()));
                self.final_state_sent = over;
            }
        }

        events.extend(self.drop_departed());
        events
    }

    /// Stops hosting. The local match state stays readable.
    pub fn close(&mut self) {
        if let Some(endpoint) = self.endpoint.as_mut() {
            endpoint.close();
        }
        self.peer_players.clear();
    }

    fn apply_remote_inputs(&mut self) {
        let Some(endpoint) = self.endpoint.as_mut() else {
            return;
        };

        for (peer, message) in endpoint.receive_pending() {
            match message {
                Message::Input {
                    player_id,
                    direction,
                } => match self.game.apply_input(&player_id, direction) {
                    InputResult::Applied => {
                        debug!("{} steered {} {}", peer, player_id, direction)
                    }
                    InputResult::Ignored => {}
                    InputResult::UnknownPlayer => {
                        warn!("Input from {} for unknown player {}", peer, player_id)
                    }
                },
                Message::Unknown => warn!("Ignoring message of unknown type from {}", peer),
                other => warn!("Unexpected {} message from {}", other.kind(), peer),
            }
        }
    }

    fn drop_departed(&mut self) -> Vec<SessionEvent> {
        let Some(endpoint) = self.endpoint.as_mut() else {
            return Vec::new();
        };

        endpoint
            .take_departed()
            .into_iter()
            .filter_map(|peer| self.peer_players.remove(&peer))
            .map(|player_id| {
                self.game.remove_player(&player_id);
                info!("{} left the match", player_id);
                SessionEvent::PlayerLeft(player_id)
            })
            .collect()
    }
}

/// Lowest `playerN` id not in the roster; slot 0 belongs to the host.
fn next_free_player_id(game: &GameState) -> String {
    let mut slot = 1;
    loop {
        let player_id = player_id_for_slot(slot);
        if !game.contains_player(&player_id) {
            return player_id;
        }
        slot += 1;
    }
}
