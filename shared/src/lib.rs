//! Types and wire plumbing shared by the authoritative host and its mirrors.
//!
//! Both sides of a match agree on the grid model ([`Position`], [`Direction`],
//! [`Snake`], [`Food`]), on the message shapes in [`protocol`] and on the
//! length-prefixed framing in [`framing`]. Everything here is synchronous and
//! free of game-role knowledge: who simulates and who mirrors is decided by
//! the `server` and `client` crates.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod config;
pub mod connection;
pub mod food;
pub mod framing;
pub mod input;
pub mod protocol;
pub mod snake;
pub mod view;

pub use config::{ConfigError, GameConfig};
pub use food::Food;
pub use protocol::{Message, SnakeState, Snapshot};
pub use snake::Snake;
pub use view::MatchView;

/// The authoritative side always plays as the first slot.
pub const HOST_PLAYER_ID: &str = "player1";

pub const PLAYER_COLORS: [Color; 6] = [
    Color(0, 255, 0),
    Color(0, 128, 255),
    Color(255, 200, 0),
    Color(255, 0, 255),
    Color(0, 255, 255),
    Color(255, 128, 0),
];

/// Grid-aligned pixel coordinate. On the wire it is a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Moves `step` pixels in `direction`. Screen coordinates: up is -y.
    pub fn offset(self, direction: Direction, step: i32) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x + dx * step,
            y: self.y + dy * step,
        }
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Position> for (i32, i32) {
    fn from(position: Position) -> Self {
        (position.x, position.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        };
        f.write_str(name)
    }
}

/// RGB display color, serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u8, pub u8, pub u8);

/// Color for the player at `index` in join order, cycling the palette.
pub fn player_color(index: usize) -> Color {
    PLAYER_COLORS[index % PLAYER_COLORS.len()]
}

/// Player identifier for a zero-based roster slot: slot 0 is `player1`.
pub fn player_id_for_slot(slot: usize) -> String {
    format!("player{}", slot + 1)
}

/// What a running instance is allowed to do with match state for the
/// lifetime of one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sole instance, simulates locally with no network.
    SinglePlayer,
    /// Simulates and broadcasts snapshots to connected mirrors.
    Server,
    /// Applies snapshots received from the server; never simulates.
    Client,
}

impl Role {
    pub fn is_authoritative(self) -> bool {
        matches!(self, Role::SinglePlayer | Role::Server)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::SinglePlayer => "single-player",
            Role::Server => "host",
            Role::Client => "client",
        };
        f.write_str(name)
    }
}
