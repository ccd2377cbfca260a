//! # Tactix
//!
//! Real-time multiplayer room server for two-player tic-tac-toe.
//!
//! One client creates a match room and receives a 6-digit code; a
//! second client joins with that code; the server relays moves between
//! them while enforcing the rules, tracks scores across rematches, and
//! tears rooms down when their last occupant leaves.
//!
//! The layers, bottom to top: `tactix-transport` (WebSocket framing),
//! `tactix-protocol` (wire vocabulary + codec), `tactix-room` (the
//! registry and per-room state machines), and this crate (accept loop
//! and per-connection handler).

mod error;
mod handler;
mod server;

pub use error::TactixError;
pub use server::{TactixServer, TactixServerBuilder};
