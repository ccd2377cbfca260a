//! The game state machine for a single room.
//!
//! Pure logic: no I/O, no channels, no clocks. The room actor drives
//! this type and interprets the returned outcomes; tests drive it
//! directly.

use tactix_protocol::{Mark, Scores};
use tactix_transport::ConnectionId;

/// Number of cells on the board, row-major.
pub const BOARD_CELLS: usize = 9;

/// The 8 winning lines in canonical enumeration order: rows, then
/// columns, then diagonals. When a move completes more than one line,
/// the first match in this order is the one reported.
const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Returns the first completed line on the board, if any.
pub fn winning_line(board: &[Option<Mark>; BOARD_CELLS]) -> Option<[usize; 3]> {
    WIN_LINES.into_iter().find(|&[a, b, c]| {
        board[a].is_some() && board[a] == board[b] && board[a] == board[c]
    })
}

/// The lifecycle phase of a room, derived from its state.
///
/// ```text
/// WaitingForOpponent → InProgress → RoundOver → InProgress (reset) → …
/// ```
///
/// The room itself outlives any number of rounds; it is destroyed only
/// when its last occupant leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// Fewer than two occupants; the game cannot conclude.
    WaitingForOpponent,
    /// A round is being played.
    InProgress,
    /// The last round concluded (win or draw); awaiting a reset.
    RoundOver,
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForOpponent => write!(f, "WaitingForOpponent"),
            Self::InProgress => write!(f, "InProgress"),
            Self::RoundOver => write!(f, "RoundOver"),
        }
    }
}

/// What a move attempt did to the room.
///
/// The caller turns these into broadcasts; a concluding move still
/// implies a move broadcast before the game-over one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Invalid in some way (inactive round, occupied cell, out of range,
    /// wrong player, not a member). State unchanged, nothing to send.
    Ignored,
    /// Mark placed; the round continues with the other player.
    Placed { cell: usize, mark: Mark },
    /// Mark placed and it completed a line. Scores already credited.
    Won {
        cell: usize,
        mark: Mark,
        line: [usize; 3],
        scores: Scores,
    },
    /// Mark placed, board full, nobody won.
    Drawn { cell: usize, mark: Mark, scores: Scores },
}

/// One room's game state: player slots, board, turn, scores, lifecycle.
///
/// Slot 0 is X, slot 1 is O; slots follow assignment order. When a
/// player leaves, the remaining occupant shifts into slot 0 and is
/// treated as X for turn validation, matching the original behavior.
#[derive(Debug, Clone)]
pub struct RoomSession {
    players: Vec<ConnectionId>,
    board: [Option<Mark>; BOARD_CELLS],
    turn: Mark,
    active: bool,
    scores: Scores,
    last_winner: Option<Mark>,
}

impl RoomSession {
    /// Creates a fresh room with the creator in the X slot.
    pub fn new(creator: ConnectionId) -> Self {
        Self {
            players: vec![creator],
            board: [None; BOARD_CELLS],
            turn: Mark::X,
            active: true,
            scores: Scores::default(),
            last_winner: None,
        }
    }

    /// Returns the derived lifecycle phase.
    pub fn phase(&self) -> RoomPhase {
        if self.players.len() < 2 {
            RoomPhase::WaitingForOpponent
        } else if self.active {
            RoomPhase::InProgress
        } else {
            RoomPhase::RoundOver
        }
    }

    /// The occupants in slot order.
    pub fn players(&self) -> &[ConnectionId] {
        &self.players
    }

    /// Returns `true` if both slots are taken.
    pub fn is_full(&self) -> bool {
        self.players.len() >= 2
    }

    /// Returns `true` if the connection occupies a slot in this room.
    pub fn contains(&self, player: ConnectionId) -> bool {
        self.players.contains(&player)
    }

    /// The mark whose turn it is.
    pub fn turn(&self) -> Mark {
        self.turn
    }

    /// The current board, row-major.
    pub fn board(&self) -> &[Option<Mark>; BOARD_CELLS] {
        &self.board
    }

    /// Accumulated round wins.
    pub fn scores(&self) -> Scores {
        self.scores
    }

    /// Winner of the previous round, if it wasn't a draw.
    pub fn last_winner(&self) -> Option<Mark> {
        self.last_winner
    }

    /// Assigns the next free slot to `player` and returns its mark.
    ///
    /// The caller (the room actor) enforces capacity; this panics in
    /// debug builds if both slots are already taken. The actor only
    /// joins into sessions with the creator seated (an emptied room
    /// is torn down, not rejoined), so joins through the actor always
    /// land on slot 1 and yield O. The slot-0 arm only fires when a
    /// fully emptied session is reseated directly.
    pub(crate) fn add_player(&mut self, player: ConnectionId) -> Mark {
        debug_assert!(!self.is_full());
        self.players.push(player);
        if self.players.len() == 1 { Mark::X } else { Mark::O }
    }

    /// Removes `player` from their slot, preserving the order of the
    /// rest. Returns `true` if they were an occupant.
    pub(crate) fn remove_player(&mut self, player: ConnectionId) -> bool {
        let before = self.players.len();
        self.players.retain(|p| *p != player);
        self.players.len() != before
    }

    /// Wipes the score tally. Happens only when an opponent departs a
    /// still-occupied room, never on a round reset.
    pub(crate) fn reset_scores(&mut self) {
        self.scores = Scores::default();
    }

    /// Attempts to place the acting player's mark at `cell`.
    ///
    /// A move is valid only if the round is active, the cell exists and
    /// is empty, and `player` occupies the slot matching the current
    /// turn. Anything else is a defensive discard: stale or duplicate
    /// client events must not desynchronize the room, so they return
    /// [`MoveOutcome::Ignored`] with no state change.
    pub fn apply_move(&mut self, player: ConnectionId, cell: usize) -> MoveOutcome {
        if !self.active {
            return MoveOutcome::Ignored;
        }
        if cell >= BOARD_CELLS || self.board[cell].is_some() {
            return MoveOutcome::Ignored;
        }
        let slot = match self.turn {
            Mark::X => 0,
            Mark::O => 1,
        };
        if self.players.get(slot) != Some(&player) {
            return MoveOutcome::Ignored;
        }

        let mark = self.turn;
        self.board[cell] = Some(mark);

        if let Some(line) = winning_line(&self.board) {
            self.scores.record_win(mark);
            self.active = false;
            self.last_winner = Some(mark);
            return MoveOutcome::Won { cell, mark, line, scores: self.scores };
        }

        if self.board.iter().all(Option::is_some) {
            self.active = false;
            self.last_winner = None;
            return MoveOutcome::Drawn { cell, mark, scores: self.scores };
        }

        self.turn = mark.opponent();
        MoveOutcome::Placed { cell, mark }
    }

    /// Clears the board for a new round. Scores are untouched.
    ///
    /// The loser of the previous round starts the next one. After a
    /// draw — or before any round has concluded — X starts.
    pub fn reset(&mut self) {
        self.board = [None; BOARD_CELLS];
        self.turn = match self.last_winner {
            Some(winner) => winner.opponent(),
            None => Mark::X,
        };
        self.active = true;
    }
}
