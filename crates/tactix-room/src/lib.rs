//! Room lifecycle management for Tactix.
//!
//! The layer is split in two so the game rules stay directly testable:
//!
//! - [`RoomSession`] — the pure state machine for one room: player
//!   slots, board, turn, scores, round lifecycle. No I/O, no channels.
//! - Room actor ([`RoomHandle`]) — an isolated Tokio task that owns one
//!   `RoomSession`, serializes all mutations through an mpsc channel,
//!   and turns state-machine outcomes into broadcasts.
//! - [`RoomRegistry`] — allocates collision-free room codes, routes
//!   commands to the right actor, and sweeps departed connections out
//!   of every room.

mod error;
mod registry;
mod room;
mod session;

pub use error::JoinError;
pub use registry::RoomRegistry;
pub use room::{EventSender, RoomHandle};
pub use session::{BOARD_CELLS, MoveOutcome, RoomPhase, RoomSession, winning_line};
