//! Application messages carried inside frames.
//!
//! Messages are internally tagged JSON objects: the `type` field selects the
//! variant and the remaining fields are its payload. Shapes:
//!
//! ```text
//! {"type": "input",    "player_id": "player2", "direction": "LEFT"}
//! {"type": "snapshot", "snakes": {...}, "food_pos": [x, y], "score": 3,
//!                      "is_game_over": false, "player_ids": ["player1", ...]}
//! {"type": "welcome",  "player_id": "player2"}
//! {"type": "rejected", "reason": "match is full"}
//! ```
//!
//! A frame whose `type` is not recognised decodes as [`Message::Unknown`] so
//! the receiver can log and skip it. A frame that is not valid JSON, or a
//! known type with the wrong shape, fails to decode and is treated as a
//! broken connection by the endpoints.

use crate::{Color, Direction, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Mirror to authority: steer a snake.
    Input {
        player_id: String,
        direction: Direction,
    },
    /// Authority to mirrors: full match state after a tick.
    Snapshot(Snapshot),
    /// Authority to a joiner: the player id it controls.
    Welcome { player_id: String },
    /// Authority to a connection it will not seat.
    Rejected { reason: String },
    #[serde(other)]
    Unknown,
}

impl Message {
    pub fn input(player_id: impl Into<String>, direction: Direction) -> Self {
        Message::Input {
            player_id: player_id.into(),
            direction,
        }
    }

    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Input { .. } => "input",
            Message::Snapshot(_) => "snapshot",
            Message::Welcome { .. } => "welcome",
            Message::Rejected { .. } => "rejected",
            Message::Unknown => "unknown",
        }
    }
}

/// Wire form of one snake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnakeState {
    pub body: Vec<Position>,
    pub direction: Direction,
    pub is_dead: bool,
    pub color: Color,
}

/// Full match state. Mirrors overwrite their copy with it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub snakes: HashMap<String, SnakeState>,
    pub food_pos: Position,
    pub score: u32,
    pub is_game_over: bool,
    /// Roster in join order.
    pub player_ids: Vec<String>,
}
