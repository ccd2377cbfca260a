//! Room registry: code allocation, lookup, and disconnect sweeps.

use std::collections::HashMap;

use rand::Rng;
use tactix_protocol::{Mark, RoomCode};
use tactix_transport::ConnectionId;

use crate::room::{EventSender, RoomHandle, spawn_room};
use crate::JoinError;

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Owns the set of live rooms and routes commands to them.
///
/// Not internally synchronized: the server holds the registry behind
/// one mutex and takes it only for lookup, spawn, and sweeps. Room
/// state itself lives in the actors, so play in one room never
/// serializes against play in another.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, RoomHandle>,
    /// Command channel size for the room actors this registry spawns.
    channel_size: usize,
}

impl RoomRegistry {
    /// Creates a new, empty registry with the default actor channel size.
    pub fn new() -> Self {
        Self::with_channel_size(DEFAULT_CHANNEL_SIZE)
    }

    /// Creates a registry whose room actors use a command channel of
    /// `channel_size`. Senders wait when the queue fills, so small sizes
    /// trade throughput for bounded memory per room.
    pub fn with_channel_size(channel_size: usize) -> Self {
        Self { rooms: HashMap::new(), channel_size }
    }

    /// Allocates a room with the creator seated as X and returns its
    /// code. The creator is acked with `room_created` and `joined(X)`
    /// through `sender`.
    pub fn create_room(
        &mut self,
        creator: ConnectionId,
        sender: EventSender,
    ) -> RoomCode {
        let code = self.generate_code();
        let handle =
            spawn_room(code.clone(), creator, sender, self.channel_size);
        self.rooms.insert(code.clone(), handle);
        tracing::info!(room_id = %code, conn_id = %creator, "room created");
        code
    }

    /// Seats `joiner` as the second player (O).
    ///
    /// On success the joiner is acked `joined(O)` and every occupant
    /// (joiner included) receives `player_joined`.
    ///
    /// # Errors
    /// [`JoinError::RoomNotFound`] if no live room has this code;
    /// [`JoinError::RoomFull`] if both slots are taken.
    pub async fn join_room(
        &mut self,
        code: &RoomCode,
        joiner: ConnectionId,
        sender: EventSender,
    ) -> Result<Mark, JoinError> {
        let handle = self
            .rooms
            .get(code)
            .ok_or_else(|| JoinError::RoomNotFound(code.clone()))?;
        handle.join(joiner, sender).await
    }

    /// Routes a move attempt to its room. A missing room — like any
    /// invalid move — is a silent no-op.
    pub async fn apply_move(
        &self,
        code: &RoomCode,
        player: ConnectionId,
        cell: usize,
    ) {
        if let Some(handle) = self.rooms.get(code) {
            handle.apply_move(player, cell).await;
        }
    }

    /// Routes a rematch request to its room. No-op if the room is
    /// missing or the requester isn't an occupant.
    pub async fn reset_round(&self, code: &RoomCode, player: ConnectionId) {
        if let Some(handle) = self.rooms.get(code) {
            handle.reset(player).await;
        }
    }

    /// Removes `player` from the given room. Deletes the room if it
    /// empties; otherwise the survivor's scores are wiped and they are
    /// notified.
    pub async fn leave(&mut self, code: &RoomCode, player: ConnectionId) {
        let Some(handle) = self.rooms.get(code) else {
            return;
        };
        match handle.leave(player).await {
            Some(reply) if reply.now_empty => {
                self.rooms.remove(code);
            }
            Some(_) => {}
            // Actor already stopped; drop the stale handle.
            None => {
                self.rooms.remove(code);
            }
        }
    }

    /// Removes `player` from every room they occupy.
    ///
    /// Connections aren't reverse-indexed to rooms, so this scans all
    /// live rooms — fine at the room counts this server sees, and it
    /// makes the operation naturally idempotent: a player already
    /// absent everywhere produces no effect at all.
    pub async fn disconnect(&mut self, player: ConnectionId) {
        let codes: Vec<RoomCode> = self.rooms.keys().cloned().collect();
        for code in codes {
            self.leave(&code, player).await;
        }
    }

    /// Returns `true` if a live room has this code.
    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Draws uniformly random 6-digit codes until one misses the live
    /// set. Practically one draw: the space holds 900k codes against a
    /// handful of concurrent rooms.
    fn generate_code(&self) -> RoomCode {
        let mut rng = rand::rng();
        loop {
            let n: u32 = rng.random_range(100_000..=999_999);
            let code = RoomCode::new(n.to_string());
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
