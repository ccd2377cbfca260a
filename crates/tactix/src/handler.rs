//! Per-connection handler: decode commands, dispatch, pump broadcasts.
//!
//! Each accepted connection runs this handler in its own task. A second
//! task pumps the connection's event channel onto the socket, so room
//! actors can broadcast to this player while the handler sits in recv.

use std::sync::Arc;

use tactix_protocol::{ClientCommand, Codec, ServerEvent};
use tactix_room::EventSender;
use tactix_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::TactixError;

/// Drop guard that sweeps a connection out of every room when the
/// handler exits, however it exits. `Drop` is synchronous, so the async
/// sweep runs in a fire-and-forget task.
struct DisconnectGuard {
    conn_id: ConnectionId,
    state: Arc<ServerState>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.registry.lock().await.disconnect(conn_id).await;
            tracing::info!(%conn_id, "connection cleaned up");
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), TactixError> {
    let conn_id = conn.id();
    let conn = Arc::new(conn);
    tracing::debug!(%conn_id, "handling new connection");

    // All outbound traffic for this player funnels through one channel
    // so acks and broadcasts reach the socket in a single order.
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ServerEvent>();

    let writer_conn = Arc::clone(&conn);
    let codec = state.codec;
    let writer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            let bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode event");
                    continue;
                }
            };
            if let Err(e) = writer_conn.send(&bytes).await {
                tracing::debug!(error = %e, "event send failed, stopping writer");
                break;
            }
        }
    });

    let guard = DisconnectGuard { conn_id, state: Arc::clone(&state) };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let cmd: ClientCommand = match state.codec.decode(&data) {
            Ok(cmd) => cmd,
            Err(e) => {
                // Malformed frames are dropped, not answered: a
                // misbehaving client must not be able to probe the room.
                tracing::debug!(%conn_id, error = %e, "undecodable frame dropped");
                continue;
            }
        };

        dispatch_command(&state, conn_id, &events_tx, cmd).await;
    }

    // Dropping the guard fires the registry sweep; once it runs, the
    // room actors release their clones of this player's sender. With
    // our own sender gone too, the writer drains and stops.
    drop(guard);
    drop(events_tx);
    let _ = writer.await;
    Ok(())
}

/// Routes one decoded command into the registry.
async fn dispatch_command(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
    events_tx: &EventSender,
    cmd: ClientCommand,
) {
    match cmd {
        ClientCommand::CreateRoom => {
            // The actor acks the creator (room_created, joined X).
            let mut registry = state.registry.lock().await;
            registry.create_room(conn_id, events_tx.clone());
        }

        ClientCommand::JoinRoom { room_id } => {
            let result = {
                let mut registry = state.registry.lock().await;
                registry.join_room(&room_id, conn_id, events_tx.clone()).await
            };
            // The actor acked success; only the rejection is ours to send.
            if let Err(e) = result {
                tracing::debug!(%conn_id, room_id = %room_id, error = %e, "join rejected");
                let _ = events_tx.send(ServerEvent::Error { message: e.to_string() });
            }
        }

        ClientCommand::Move { room_id, cell } => {
            let registry = state.registry.lock().await;
            registry.apply_move(&room_id, conn_id, cell).await;
        }

        ClientCommand::ResetGame { room_id } => {
            let registry = state.registry.lock().await;
            registry.reset_round(&room_id, conn_id).await;
        }

        ClientCommand::LeaveRoom { room_id } => {
            let mut registry = state.registry.lock().await;
            registry.leave(&room_id, conn_id).await;
        }
    }
}
