//! Error types for the room layer.

use tactix_protocol::RoomCode;

/// The only user-facing rejection the room layer produces.
///
/// Everything else — out-of-turn moves, resets for rooms the sender
/// doesn't occupy, departures from unknown rooms — is discarded
/// silently by design.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    /// No live room has this code.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// Both player slots are taken.
    #[error("room {0} is full")]
    RoomFull(RoomCode),
}
