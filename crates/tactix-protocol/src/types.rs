//! Core protocol types for the Tactix wire format.
//!
//! Everything here is serialized as internally tagged JSON
//! (`{"type": "...", ...}` with snake_case tags) so browser clients can
//! dispatch on a single `type` field.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A room's public identifier: a 6-digit decimal string.
///
/// Codes are allocated by the registry from the range [100000, 999999]
/// and are unique among *live* rooms only — a code can be reused after
/// its room is destroyed. The newtype keeps room codes from being mixed
/// up with other strings, and `#[serde(transparent)]` makes it appear as
/// a plain JSON string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Wraps a raw string as a room code.
    ///
    /// No validation happens here: codes arriving from clients are
    /// looked up as-is, and a malformed code simply never matches a
    /// live room.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Marks and scores
// ---------------------------------------------------------------------------

/// One of the two symbols a player places on the board.
///
/// Doubles as the player-slot identifier: the room creator holds X
/// (slot 0), the joiner holds O (slot 1). Serializes as `"X"` / `"O"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// Returns the other mark.
    pub fn opponent(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("X"),
            Self::O => f.write_str("O"),
        }
    }
}

/// Rounds won per mark within one room.
///
/// Persists across round resets; wiped only when an opponent leaves a
/// still-occupied room. Wire shape is `{"X": n, "O": n}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    #[serde(rename = "X")]
    pub x: u32,
    #[serde(rename = "O")]
    pub o: u32,
}

impl Scores {
    /// Credits one round win to the given mark.
    pub fn record_win(&mut self, mark: Mark) {
        match mark {
            Mark::X => self.x += 1,
            Mark::O => self.o += 1,
        }
    }

    /// Returns the win count for the given mark.
    pub fn of(&self, mark: Mark) -> u32 {
        match mark {
            Mark::X => self.x,
            Mark::O => self.o,
        }
    }
}

// ---------------------------------------------------------------------------
// Client → server commands
// ---------------------------------------------------------------------------

/// Every message a client may send.
///
/// Commands carry the room code explicitly rather than relying on
/// server-side "current room" tracking, so a stale client can never
/// act on a room it believes it is in but isn't.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Allocate a new room; the sender becomes X.
    CreateRoom,

    /// Enter an existing room as the second player (O).
    JoinRoom { room_id: RoomCode },

    /// Place the sender's mark at `cell` (0..=8, row-major).
    Move { room_id: RoomCode, cell: usize },

    /// Start a new round in a concluded (or abandoned) game.
    ResetGame { room_id: RoomCode },

    /// Explicitly depart a room without closing the connection.
    LeaveRoom { room_id: RoomCode },
}

// ---------------------------------------------------------------------------
// Server → client events
// ---------------------------------------------------------------------------

/// Every message the server may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Ack to the creator: the room exists under this code.
    RoomCreated { room_id: RoomCode },

    /// Ack to a connection that just entered a room, telling it its mark.
    Joined { mark: Mark },

    /// Broadcast to the room when the second player arrives.
    PlayerJoined,

    /// A join was rejected (room not found / room full).
    Error { message: String },

    /// Broadcast of a successfully placed mark.
    Move { cell: usize, mark: Mark },

    /// The round concluded. `winner` is `None` on a draw, in which case
    /// `winning_line` is omitted entirely.
    GameOver {
        winner: Option<Mark>,
        #[serde(skip_serializing_if = "Option::is_none")]
        winning_line: Option<[usize; 3]>,
        scores: Scores,
    },

    /// Broadcast that the board was cleared for a new round.
    ResetGame,

    /// Broadcast to the remaining occupant when their opponent departs.
    OpponentDisconnected,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is consumed by JavaScript clients that dispatch on
    //! the `type` tag, so these tests pin the exact JSON shapes.

    use super::*;

    #[test]
    fn test_room_code_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomCode::new("123456")).unwrap();
        assert_eq!(json, "\"123456\"");
    }

    #[test]
    fn test_room_code_display() {
        assert_eq!(RoomCode::new("654321").to_string(), "654321");
    }

    #[test]
    fn test_mark_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&Mark::X).unwrap(), "\"X\"");
        assert_eq!(serde_json::to_string(&Mark::O).unwrap(), "\"O\"");
    }

    #[test]
    fn test_mark_opponent() {
        assert_eq!(Mark::X.opponent(), Mark::O);
        assert_eq!(Mark::O.opponent(), Mark::X);
    }

    #[test]
    fn test_scores_wire_shape_uses_mark_letters() {
        let scores = Scores { x: 2, o: 1 };
        let json: serde_json::Value = serde_json::to_value(scores).unwrap();
        assert_eq!(json["X"], 2);
        assert_eq!(json["O"], 1);
    }

    #[test]
    fn test_scores_record_win() {
        let mut scores = Scores::default();
        scores.record_win(Mark::X);
        scores.record_win(Mark::X);
        scores.record_win(Mark::O);
        assert_eq!(scores.of(Mark::X), 2);
        assert_eq!(scores.of(Mark::O), 1);
    }

    #[test]
    fn test_client_command_create_room_json_format() {
        let json: serde_json::Value =
            serde_json::to_value(ClientCommand::CreateRoom).unwrap();
        assert_eq!(json["type"], "create_room");
    }

    #[test]
    fn test_client_command_move_json_format() {
        let cmd = ClientCommand::Move {
            room_id: RoomCode::new("100000"),
            cell: 4,
        };
        let json: serde_json::Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "move");
        assert_eq!(json["room_id"], "100000");
        assert_eq!(json["cell"], 4);
    }

    #[test]
    fn test_client_command_round_trips() {
        let cmds = [
            ClientCommand::CreateRoom,
            ClientCommand::JoinRoom { room_id: RoomCode::new("123456") },
            ClientCommand::Move { room_id: RoomCode::new("123456"), cell: 8 },
            ClientCommand::ResetGame { room_id: RoomCode::new("123456") },
            ClientCommand::LeaveRoom { room_id: RoomCode::new("123456") },
        ];
        for cmd in cmds {
            let bytes = serde_json::to_vec(&cmd).unwrap();
            let decoded: ClientCommand = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(cmd, decoded);
        }
    }

    #[test]
    fn test_server_event_joined_json_format() {
        let json: serde_json::Value =
            serde_json::to_value(ServerEvent::Joined { mark: Mark::O }).unwrap();
        assert_eq!(json["type"], "joined");
        assert_eq!(json["mark"], "O");
    }

    #[test]
    fn test_server_event_game_over_with_winner() {
        let ev = ServerEvent::GameOver {
            winner: Some(Mark::X),
            winning_line: Some([0, 1, 2]),
            scores: Scores { x: 1, o: 0 },
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "game_over");
        assert_eq!(json["winner"], "X");
        assert_eq!(json["winning_line"], serde_json::json!([0, 1, 2]));
        assert_eq!(json["scores"]["X"], 1);
    }

    #[test]
    fn test_server_event_game_over_draw_omits_line() {
        let ev = ServerEvent::GameOver {
            winner: None,
            winning_line: None,
            scores: Scores::default(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert!(json["winner"].is_null());
        assert!(json.get("winning_line").is_none());
    }

    #[test]
    fn test_server_event_unit_variants_json_format() {
        let json: serde_json::Value =
            serde_json::to_value(ServerEvent::PlayerJoined).unwrap();
        assert_eq!(json["type"], "player_joined");

        let json: serde_json::Value =
            serde_json::to_value(ServerEvent::OpponentDisconnected).unwrap();
        assert_eq!(json["type"], "opponent_disconnected");

        let json: serde_json::Value =
            serde_json::to_value(ServerEvent::ResetGame).unwrap();
        assert_eq!(json["type"], "reset_game");
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        let garbage = b"not json at all";
        let result: Result<ClientCommand, _> = serde_json::from_slice(garbage);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_unknown_command_type_returns_error() {
        let unknown = r#"{"type": "fly_to_moon", "speed": 9000}"#;
        let result: Result<ClientCommand, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_missing_field_returns_error() {
        // A join without a room code must not decode.
        let wrong = r#"{"type": "join_room"}"#;
        let result: Result<ClientCommand, _> = serde_json::from_str(wrong);
        assert!(result.is_err());
    }
}
