//! # Snake Match Client Library
//!
//! This library is everything a player's instance runs: the menu, the three
//! ways to take part in a match, and the connection to a remote host.
//!
//! ## Architecture Overview
//!
//! An instance plays exactly one role per match:
//!
//! ### Single-Player and Host
//! Both run the authoritative simulation from the `server` crate locally.
//! Single-player has no network at all. A host additionally listens for
//! players and waits until the roster is full before the match starts.
//!
//! ### Client
//! Connects to a host and mirrors its state. Direction changes are sent to
//! the host and only show up once the host's next snapshot arrives; there is
//! no local prediction and so nothing to reconcile.
//!
//! ## Module Organization
//!
//! ### App Module (`app`)
//! The driver state machine: menu, waiting for players, and the running
//! match. Connection loss returns the instance to the menu with a status
//! message; abandoned matches are not resumed.
//!
//! ### Game Module (`game`)
//! The mirrored match state and the snapshot application that replaces it
//! wholesale.
//!
//! ### Network Module (`network`)
//! The single non-blocking TCP connection to the host:
//! - One connection attempt, no retries
//! - Sends that mark the connection dead on failure
//! - Receives that never wait
//!
//! ### Session Module (`session`)
//! Couples the connection with the mirrored state: drains incoming messages
//! every tick, records the player id the host assigned, and forwards local
//! steering.

pub mod app;
pub mod game;
pub mod network;
pub mod session;

pub use app::{ActiveSession, App, AppState};
pub use game::ClientGameState;
pub use network::{Client, ClientEvent};
pub use session::{MirrorEvent, MirrorSession};
