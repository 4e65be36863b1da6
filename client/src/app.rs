//! Top-level driver: menu, waiting for players, and the running match
//!
//! The binary feeds [`App`] parsed commands as they arrive and calls
//! [`App::on_tick`] at the tick rate. Everything a front end needs to draw
//! comes out of [`App::view`] and [`App::status`].

use crate::session::{MirrorEvent, MirrorSession};
use log::{debug, info};
use server::{HostSession, ServerConfig, SessionEvent};
use shared::input::InputCommand;
use shared::{Direction, GameConfig, MatchView, Role};
use std::net::SocketAddr;

pub const MENU_HINT: &str = "Type single, host or join <address>";

/// The match an instance is taking part in, by role.
#[derive(Debug)]
pub enum ActiveSession {
    /// Single-player or host: simulates locally.
    Authority(HostSession),
    /// Client: mirrors the host's snapshots.
    Mirror(MirrorSession),
}

impl ActiveSession {
    pub fn role(&self) -> Role {
        match self {
            ActiveSession::Authority(session) => session.role(),
            ActiveSession::Mirror(_) => Role::Client,
        }
    }

    pub fn view(&self) -> &dyn MatchView {
        match self {
            ActiveSession::Authority(session) => session.game() as &dyn MatchView,
            ActiveSession::Mirror(session) => session.state(),
        }
    }

    pub fn steer(&mut self, direction: Direction) {
        match self {
            ActiveSession::Authority(session) => session.handle_local_input(direction),
            ActiveSession::Mirror(session) => {
                session.send_direction(direction);
            }
        }
    }

    /// Restarts the match on authoritative roles. Mirrors log and ignore it.
    pub fn reset(&mut self) {
        match self {
            ActiveSession::Authority(session) => session.reset(),
            ActiveSession::Mirror(session) => session.request_reset(),
        }
    }

    /// Runs one tick. Returns a status message when the match is abandoned.
    pub fn tick(&mut self) -> Option<String> {
        match self {
            ActiveSession::Authority(session) => {
                session.tick().into_iter().find_map(|event| match event {
                    SessionEvent::PlayerLeft(player_id) => {
                        Some(format!("{} disconnected, match abandoned", player_id))
                    }
                    _ => None,
                })
            }
            ActiveSession::Mirror(session) => {
                session.poll().into_iter().find_map(|event| match event {
                    MirrorEvent::Rejected(reason) => Some(format!("Host refused: {}", reason)),
                    MirrorEvent::Disconnected => Some("Connection to host lost".to_string()),
                    MirrorEvent::Welcomed(_) => None,
                })
            }
        }
    }

    pub fn close(&mut self) {
        match self {
            ActiveSession::Authority(session) => session.close(),
            ActiveSession::Mirror(session) => session.close(),
        }
    }
}

#[derive(Debug)]
pub enum AppState {
    /// No match. `status` explains how we got here.
    Menu { status: String },
    /// Listening, waiting for the roster to fill.
    Hosting(HostSession),
    InMatch(ActiveSession),
}

#[derive(Debug)]
pub struct App {
    state: AppState,
    game_config: GameConfig,
    server_config: ServerConfig,
    quit: bool,
}

impl App {
    pub fn new(game_config: GameConfig, server_config: ServerConfig) -> Self {
        Self {
            state: AppState::Menu {
                status: MENU_HINT.to_string(),
            },
            game_config,
            server_config,
            quit: false,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Menu status line, if the menu is showing.
    pub fn status(&self) -> Option<&str> {
        match &self.state {
            AppState::Menu { status } => Some(status.as_str()),
            _ => None,
        }
    }

    /// State to draw, if a match is running.
    pub fn view(&self) -> Option<&dyn MatchView> {
        match &self.state {
            AppState::InMatch(session) => Some(session.view()),
            _ => None,
        }
    }

    /// Listening address while hosting.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.state {
            AppState::Hosting(session) => session.local_addr(),
            AppState::InMatch(ActiveSession::Authority(session)) => session.local_addr(),
            _ => None,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn handle_command(&mut self, command: InputCommand) {
        match command {
            InputCommand::Quit => {
                self.leave("Goodbye");
                self.quit = true;
            }
            InputCommand::Leave => self.leave("Left the match"),
            InputCommand::Steer(direction) => match &mut self.state {
                AppState::InMatch(session) => session.steer(direction),
                _ => debug!("No match running, ignoring {}", direction),
            },
            InputCommand::Reset => match &mut self.state {
                AppState::InMatch(session) => session.reset(),
                _ => debug!("No match running, ignoring reset"),
            },
            InputCommand::SinglePlayer | InputCommand::Host | InputCommand::Join(_) => {
                if matches!(self.state, AppState::Menu { .. }) {
                    self.start(command);
                } else {
                    debug!("Already in a session, ignoring {:?}", command);
                }
            }
        }
    }

    /// Advances whatever is running by one tick.
    pub fn on_tick(&mut self) {
        let state = std::mem::replace(
            &mut self.state,
            AppState::Menu {
                status: String::new(),
            },
        );

        self.state = match state {
            AppState::Hosting(mut session) => {
                for event in session.accept_joins() {
                    if let SessionEvent::PlayerJoined(player_id) = event {
                        info!("{} joined, {} connected", player_id, session.peer_count());
                    }
                }
                if session.is_full() {
                    info!("Roster full, starting match");
                    session.reset();
                    AppState::InMatch(ActiveSession::Authority(session))
                } else {
                    AppState::Hosting(session)
                }
            }
            AppState::InMatch(mut session) => match session.tick() {
                Some(status) => {
                    info!("{}", status);
                    session.close();
                    AppState::Menu { status }
                }
                None => AppState::InMatch(session),
            },
            menu => menu,
        };
    }

    fn start(&mut self, command: InputCommand) {
        self.state = match command {
            InputCommand::SinglePlayer => {
                match HostSession::single_player(self.game_config.clone()) {
                    Ok(session) => AppState::InMatch(ActiveSession::Authority(session)),
                    Err(e) => AppState::Menu {
                        status: format!("Could not start a match: {}", e),
                    },
                }
            }
            InputCommand::Host => {
                match HostSession::host(self.game_config.clone(), self.server_config.clone()) {
                    Ok(session) => {
                        info!("Waiting for players on {:?}", session.local_addr());
                        AppState::Hosting(session)
                    }
                    Err(e) => AppState::Menu {
                        status: format!(
                            "Could not host on {}: {}",
                            self.server_config.bind_addr, e
                        ),
                    },
                }
            }
            InputCommand::Join(addr) => match MirrorSession::join(&addr) {
                Some(session) => AppState::InMatch(ActiveSession::Mirror(session)),
                None => AppState::Menu {
                    status: format!("Could not connect to {}", addr),
                },
            },
            other => {
                debug!("{:?} does not start a session", other);
                return;
            }
        };
    }

    fn leave(&mut self, status: &str) {
        match &mut self.state {
            AppState::Hosting(session) => session.close(),
            AppState::InMatch(session) => session.close(),
            AppState::Menu { .. } => {}
        }
        self.state = AppState::Menu {
            status: status.to_string(),
        };
    }
}
