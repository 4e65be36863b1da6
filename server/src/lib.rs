//! # Snake Match Server Library
//!
//! This library holds the authoritative side of a networked snake match. The
//! instance that owns a match simulates it, decides every collision and food
//! placement, and pushes the full resulting state to the players connected
//! to it.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Only the host advances the match. Connected players send direction
//! changes and apply whatever snapshot arrives; they never run the rules
//! themselves, so there is nothing to reconcile.
//!
//! ### Peer Management
//! Handles the lifecycle of remote players:
//! - Accepting connections and assigning `player2`, `player3`, ...
//! - Rejecting connections once the roster is full
//! - Removing a player's snake when its connection breaks
//!
//! ### State Broadcasting
//! After every simulation step the complete match state is sent to every
//! peer. Once the match ends the final state goes out once and broadcasting
//! pauses until the host resets.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded, Poll-Driven
//! Nothing here spawns tasks or blocks. The owner calls
//! [`session::HostSession::tick`] at the tick rate and every socket
//! operation inside returns immediately, so one loop drives networking and
//! simulation without locks.
//!
//! ### TCP with Length-Prefixed Frames
//! Peers talk over TCP using the framing from `shared::framing`. A peer that
//! closes, errors or sends a malformed frame is dropped; other peers are not
//! affected.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! The roster of accepted connections:
//! - Monotonic peer ids that are never reused
//! - Capacity checks
//! - A list of peers that went away since the last poll
//!
//! ### Game Module (`game`)
//! The match itself: snakes in join order, food, score and the game-over
//! flag, plus the per-tick step that moves, feeds and collides snakes.
//!
//! ### Network Module (`network`)
//! The non-blocking TCP listener and per-peer streams: accept, receive one
//! message per peer, broadcast, targeted send and close.
//!
//! ### Session Module (`session`)
//! Ties a match to an optional endpoint. Single-player is a session without
//! one; hosting adds joiners, their inputs and the snapshot broadcast.

pub mod client_manager;
pub mod game;
pub mod network;
pub mod session;

pub use game::GameState;
pub use network::{Server, ServerConfig};
pub use session::{HostSession, SessionEvent};
