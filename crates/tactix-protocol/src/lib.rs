//! Wire protocol for Tactix.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`ClientCommand`], [`ServerEvent`], [`Mark`], [`Scores`],
//!   [`RoomCode`]) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding or
//!   decoding.
//!
//! The protocol layer sits between transport (raw frames) and the room
//! layer (game state). It knows nothing about connections or rooms — it
//! only knows how to serialize and deserialize messages.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientCommand, Mark, RoomCode, Scores, ServerEvent};
