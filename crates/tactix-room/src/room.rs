//! Room actor: an isolated Tokio task that owns one game session.
//!
//! Each room runs in its own task, fed through an mpsc channel. All
//! mutations of a room's state go through that single consumer, which
//! gives per-room serialization without any lock shared across rooms.
//! Broadcasts leave through per-occupant event channels the actor holds.

use std::collections::HashMap;

use tactix_protocol::{Mark, RoomCode, ServerEvent};
use tactix_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::session::{MoveOutcome, RoomSession};
use crate::JoinError;

/// Channel sender for delivering server events to one connection.
///
/// The connection handler owns the receiving end and pumps events onto
/// the socket; if the receiver is gone the send is silently dropped.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel.
///
/// `Join` and `Leave` carry a reply channel because the registry needs
/// the outcome (mark assignment, room emptiness); moves and resets are
/// fire-and-forget, matching the silent-discard policy for invalid ones.
pub(crate) enum RoomCommand {
    Join {
        player: ConnectionId,
        sender: EventSender,
        reply: oneshot::Sender<Result<Mark, JoinError>>,
    },
    Move {
        player: ConnectionId,
        cell: usize,
    },
    Reset {
        player: ConnectionId,
    },
    Leave {
        player: ConnectionId,
        reply: oneshot::Sender<LeaveReply>,
    },
}

/// Outcome of a leave processed by the actor.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LeaveReply {
    /// The player actually occupied a slot and was removed.
    pub removed: bool,
    /// No occupants remain; the registry must drop the room.
    pub now_empty: bool,
}

/// Handle to a running room actor. Cheap to clone; the registry holds
/// one per live room.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's public code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub(crate) async fn join(
        &self,
        player: ConnectionId,
        sender: EventSender,
    ) -> Result<Mark, JoinError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join { player, sender, reply: reply_tx })
            .await
            .map_err(|_| JoinError::RoomNotFound(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| JoinError::RoomNotFound(self.code.clone()))?
    }

    pub(crate) async fn apply_move(&self, player: ConnectionId, cell: usize) {
        let _ = self.sender.send(RoomCommand::Move { player, cell }).await;
    }

    pub(crate) async fn reset(&self, player: ConnectionId) {
        let _ = self.sender.send(RoomCommand::Reset { player }).await;
    }

    /// Returns `None` if the actor is already gone (room destroyed).
    pub(crate) async fn leave(&self, player: ConnectionId) -> Option<LeaveReply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave { player, reply: reply_tx })
            .await
            .ok()?;
        reply_rx.await.ok()
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct RoomActor {
    code: RoomCode,
    session: RoomSession,
    /// Per-occupant outbound channels, keyed by connection.
    senders: HashMap<ConnectionId, EventSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Processes commands until the room empties or the registry drops
    /// the handle.
    async fn run(mut self) {
        tracing::info!(room_id = %self.code, "room opened");

        // The creator's acks: the room exists, and they hold X.
        if let Some(&creator) = self.session.players().first() {
            self.send_to(creator, ServerEvent::RoomCreated { room_id: self.code.clone() });
            self.send_to(creator, ServerEvent::Joined { mark: Mark::X });
        }

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join { player, sender, reply } => {
                    let result = self.handle_join(player, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Move { player, cell } => {
                    self.handle_move(player, cell);
                }
                RoomCommand::Reset { player } => {
                    self.handle_reset(player);
                }
                RoomCommand::Leave { player, reply } => {
                    let outcome = self.handle_leave(player);
                    let _ = reply.send(outcome);
                    if outcome.now_empty {
                        break;
                    }
                }
            }
        }

        tracing::info!(room_id = %self.code, "room closed");
    }

    fn handle_join(
        &mut self,
        player: ConnectionId,
        sender: EventSender,
    ) -> Result<Mark, JoinError> {
        if self.session.is_full() {
            return Err(JoinError::RoomFull(self.code.clone()));
        }

        let mark = self.session.add_player(player);
        self.senders.insert(player, sender);
        tracing::info!(
            room_id = %self.code,
            conn_id = %player,
            %mark,
            "player joined"
        );

        // Ack the joiner with their mark first, then tell the whole
        // room (joiner included) that the lineup changed.
        self.send_to(player, ServerEvent::Joined { mark });
        self.broadcast(ServerEvent::PlayerJoined);
        Ok(mark)
    }

    fn handle_move(&mut self, player: ConnectionId, cell: usize) {
        match self.session.apply_move(player, cell) {
            MoveOutcome::Ignored => {
                tracing::debug!(
                    room_id = %self.code,
                    conn_id = %player,
                    cell,
                    "move discarded"
                );
            }
            MoveOutcome::Placed { cell, mark } => {
                self.broadcast(ServerEvent::Move { cell, mark });
            }
            MoveOutcome::Won { cell, mark, line, scores } => {
                self.broadcast(ServerEvent::Move { cell, mark });
                self.broadcast(ServerEvent::GameOver {
                    winner: Some(mark),
                    winning_line: Some(line),
                    scores,
                });
                tracing::info!(room_id = %self.code, winner = %mark, "round won");
            }
            MoveOutcome::Drawn { cell, mark, scores } => {
                self.broadcast(ServerEvent::Move { cell, mark });
                self.broadcast(ServerEvent::GameOver {
                    winner: None,
                    winning_line: None,
                    scores,
                });
                tracing::info!(room_id = %self.code, "round drawn");
            }
        }
    }

    fn handle_reset(&mut self, player: ConnectionId) {
        // Only occupants may start a rematch; anything else is a stale
        // or spoofed command and is dropped.
        if !self.session.contains(player) {
            tracing::debug!(
                room_id = %self.code,
                conn_id = %player,
                "reset from non-member discarded"
            );
            return;
        }
        self.session.reset();
        self.broadcast(ServerEvent::ResetGame);
    }

    fn handle_leave(&mut self, player: ConnectionId) -> LeaveReply {
        if !self.session.remove_player(player) {
            return LeaveReply { removed: false, now_empty: false };
        }
        self.senders.remove(&player);
        tracing::info!(room_id = %self.code, conn_id = %player, "player left");

        if self.session.players().is_empty() {
            return LeaveReply { removed: true, now_empty: true };
        }

        // An abandoned opponent keeps the room but not the streak.
        self.session.reset_scores();
        self.broadcast(ServerEvent::OpponentDisconnected);
        LeaveReply { removed: true, now_empty: false }
    }

    /// Sends an event to every occupant.
    fn broadcast(&self, event: ServerEvent) {
        for sender in self.senders.values() {
            let _ = sender.send(event.clone());
        }
    }

    /// Sends an event to a single occupant. Silently drops if their
    /// receiver is gone (connection already closing).
    fn send_to(&self, player: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&player) {
            let _ = sender.send(event);
        }
    }
}

/// Spawns a room actor with the creator already seated in the X slot,
/// and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it fills.
pub(crate) fn spawn_room(
    code: RoomCode,
    creator: ConnectionId,
    creator_sender: EventSender,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        code: code.clone(),
        session: RoomSession::new(creator),
        senders: HashMap::from([(creator, creator_sender)]),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
