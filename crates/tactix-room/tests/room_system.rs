//! Integration tests for the registry + room actors.
//!
//! These drive the registry the way the connection handler does: every
//! player is an event channel, and assertions read the broadcasts the
//! actors push into those channels.

use std::collections::HashSet;
use std::time::Duration;

use tactix_protocol::{Mark, RoomCode, Scores, ServerEvent};
use tactix_room::{EventSender, RoomRegistry};
use tactix_transport::ConnectionId;
use tokio::sync::mpsc;

fn cid(id: u64) -> ConnectionId {
    ConnectionId::new(id)
}

fn channel() -> (EventSender, mpsc::UnboundedReceiver<ServerEvent>) {
    mpsc::unbounded_channel()
}

/// A sender whose receiver is dropped immediately — for tests that
/// don't care about the broadcasts.
fn dummy_sender() -> EventSender {
    channel().0
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

#[tokio::test]
async fn test_create_room_acks_creator_with_code_and_mark() {
    let mut registry = RoomRegistry::new();
    let (tx, mut rx) = channel();

    let code = registry.create_room(cid(1), tx);

    match next_event(&mut rx).await {
        ServerEvent::RoomCreated { room_id } => assert_eq!(room_id, code),
        other => panic!("expected room_created, got {other:?}"),
    }
    assert_eq!(next_event(&mut rx).await, ServerEvent::Joined { mark: Mark::X });
    assert!(registry.contains(&code));
}

#[tokio::test]
async fn test_join_acks_joiner_then_broadcasts_to_room() {
    let mut registry = RoomRegistry::new();
    let (tx1, mut rx1) = channel();
    let (tx2, mut rx2) = channel();

    let code = registry.create_room(cid(1), tx1);
    let _ = next_event(&mut rx1).await; // room_created
    let _ = next_event(&mut rx1).await; // joined X

    let mark = registry.join_room(&code, cid(2), tx2).await.unwrap();
    assert_eq!(mark, Mark::O);

    // Joiner: its own ack first, then the lineup broadcast.
    assert_eq!(next_event(&mut rx2).await, ServerEvent::Joined { mark: Mark::O });
    assert_eq!(next_event(&mut rx2).await, ServerEvent::PlayerJoined);
    // Creator sees the broadcast too.
    assert_eq!(next_event(&mut rx1).await, ServerEvent::PlayerJoined);
}

#[tokio::test]
async fn test_join_nonexistent_room_fails() {
    let mut registry = RoomRegistry::new();
    let result = registry
        .join_room(&RoomCode::new("000000"), cid(1), dummy_sender())
        .await;
    assert!(matches!(
        result,
        Err(tactix_room::JoinError::RoomNotFound(_))
    ));
}

#[tokio::test]
async fn test_join_full_room_fails_without_mutation() {
    let mut registry = RoomRegistry::new();
    let (tx1, mut rx1) = channel();
    let code = registry.create_room(cid(1), tx1);
    registry.join_room(&code, cid(2), dummy_sender()).await.unwrap();

    let result = registry.join_room(&code, cid(3), dummy_sender()).await;
    assert!(matches!(result, Err(tactix_room::JoinError::RoomFull(_))));

    // The original pair is untouched: X can still open the game.
    registry.apply_move(&code, cid(1), 0).await;
    let _ = next_event(&mut rx1).await; // room_created
    let _ = next_event(&mut rx1).await; // joined X
    let _ = next_event(&mut rx1).await; // player_joined
    assert_eq!(
        next_event(&mut rx1).await,
        ServerEvent::Move { cell: 0, mark: Mark::X }
    );
}

#[tokio::test]
async fn test_win_broadcasts_move_then_game_over() {
    let mut registry = RoomRegistry::new();
    let (tx1, _rx1) = channel();
    let (tx2, mut rx2) = channel();
    let code = registry.create_room(cid(1), tx1);
    registry.join_room(&code, cid(2), tx2).await.unwrap();
    let _ = next_event(&mut rx2).await; // joined O
    let _ = next_event(&mut rx2).await; // player_joined

    // X: 0, 1, 2 (top row); O: 3, 4.
    for (player, cell) in [(1, 0), (2, 3), (1, 1), (2, 4), (1, 2)] {
        registry.apply_move(&code, cid(player as u64), cell).await;
    }

    let mut events = Vec::new();
    for _ in 0..6 {
        events.push(next_event(&mut rx2).await);
    }
    assert_eq!(events[4], ServerEvent::Move { cell: 2, mark: Mark::X });
    assert_eq!(
        events[5],
        ServerEvent::GameOver {
            winner: Some(Mark::X),
            winning_line: Some([0, 1, 2]),
            scores: Scores { x: 1, o: 0 },
        }
    );
}

#[tokio::test]
async fn test_last_departure_deletes_room() {
    let mut registry = RoomRegistry::new();
    let code = registry.create_room(cid(1), dummy_sender());
    assert_eq!(registry.room_count(), 1);

    registry.leave(&code, cid(1)).await;

    assert!(!registry.contains(&code));
    assert_eq!(registry.room_count(), 0);
    // A later lookup fails like the room never existed.
    let result = registry.join_room(&code, cid(2), dummy_sender()).await;
    assert!(matches!(
        result,
        Err(tactix_room::JoinError::RoomNotFound(_))
    ));
}

#[tokio::test]
async fn test_departure_notifies_survivor_and_wipes_scores() {
    let mut registry = RoomRegistry::new();
    let (tx1, mut rx1) = channel();
    let code = registry.create_room(cid(1), tx1);
    registry.join_room(&code, cid(2), dummy_sender()).await.unwrap();

    // X takes a round: scores X=1.
    for (player, cell) in [(1, 0), (2, 3), (1, 1), (2, 4), (1, 2)] {
        registry.apply_move(&code, cid(player as u64), cell).await;
    }

    registry.disconnect(cid(2)).await;
    assert!(registry.contains(&code), "room must survive with one occupant");

    // Drain the creator's backlog up to the departure notice.
    loop {
        match next_event(&mut rx1).await {
            ServerEvent::OpponentDisconnected => break,
            _ => continue,
        }
    }

    // A new opponent arrives; the survivor resets and loses the next
    // round. The reported tally must show the wipe: O=1, X=0.
    registry.join_room(&code, cid(3), dummy_sender()).await.unwrap();
    registry.reset_round(&code, cid(1)).await;
    // X won the previous round, so O (the newcomer) starts.
    for (player, cell) in [(3, 0), (1, 3), (3, 1), (1, 4), (3, 2)] {
        registry.apply_move(&code, cid(player as u64), cell).await;
    }

    loop {
        if let ServerEvent::GameOver { winner, scores, .. } =
            next_event(&mut rx1).await
        {
            assert_eq!(winner, Some(Mark::O));
            assert_eq!(scores, Scores { x: 0, o: 1 });
            break;
        }
    }
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let mut registry = RoomRegistry::new();
    let code = registry.create_room(cid(1), dummy_sender());
    registry.join_room(&code, cid(2), dummy_sender()).await.unwrap();

    registry.disconnect(cid(2)).await;
    // Processing the same disconnect again is a no-op, not an error.
    registry.disconnect(cid(2)).await;
    assert!(registry.contains(&code));

    registry.disconnect(cid(1)).await;
    registry.disconnect(cid(1)).await;
    assert_eq!(registry.room_count(), 0);
}

#[tokio::test]
async fn test_moves_for_unknown_rooms_are_silent_noops() {
    let registry = RoomRegistry::new();
    // Neither may panic or surface an error.
    registry.apply_move(&RoomCode::new("123456"), cid(1), 0).await;
    registry.reset_round(&RoomCode::new("123456"), cid(1)).await;
}

#[tokio::test]
async fn test_reset_from_non_member_is_discarded() {
    let mut registry = RoomRegistry::new();
    let (tx1, mut rx1) = channel();
    let code = registry.create_room(cid(1), tx1);
    registry.join_room(&code, cid(2), dummy_sender()).await.unwrap();
    let _ = next_event(&mut rx1).await; // room_created
    let _ = next_event(&mut rx1).await; // joined X
    let _ = next_event(&mut rx1).await; // player_joined

    registry.reset_round(&code, cid(99)).await;
    // A member's reset still lands, and it is the next thing we see —
    // proving the outsider's produced no broadcast.
    registry.reset_round(&code, cid(1)).await;
    assert_eq!(next_event(&mut rx1).await, ServerEvent::ResetGame);
}

#[tokio::test]
async fn test_tiny_actor_channel_still_plays_a_full_round() {
    // A command queue of 1 forces senders to wait on every enqueue;
    // the game must come out identical, just with backpressure.
    let mut registry = RoomRegistry::with_channel_size(1);
    let (tx1, _rx1) = channel();
    let (tx2, mut rx2) = channel();
    let code = registry.create_room(cid(1), tx1);
    registry.join_room(&code, cid(2), tx2).await.unwrap();
    let _ = next_event(&mut rx2).await; // joined O
    let _ = next_event(&mut rx2).await; // player_joined

    for (player, cell) in [(1, 0), (2, 3), (1, 1), (2, 4), (1, 2)] {
        registry.apply_move(&code, cid(player as u64), cell).await;
    }

    let mut events = Vec::new();
    for _ in 0..6 {
        events.push(next_event(&mut rx2).await);
    }
    assert_eq!(events[4], ServerEvent::Move { cell: 2, mark: Mark::X });
    assert!(matches!(
        events[5],
        ServerEvent::GameOver { winner: Some(Mark::X), .. }
    ));
}

#[tokio::test]
async fn test_room_codes_are_six_digits_and_collision_free() {
    let mut registry = RoomRegistry::new();
    let mut seen = HashSet::new();
    for i in 0..200 {
        let code = registry.create_room(cid(i), dummy_sender());
        let s = code.as_str();
        assert_eq!(s.len(), 6, "code {s} is not 6 digits");
        assert!(s.chars().all(|c| c.is_ascii_digit()), "code {s}");
        assert!(s.as_bytes()[0] != b'0', "code {s} has a leading zero");
        assert!(seen.insert(code.clone()), "collision on {s}");
    }
    assert_eq!(registry.room_count(), 200);
}
