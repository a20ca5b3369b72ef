//! End-to-end session tests driven through the registry.
//!
//! Each test pairs two in-memory connections, plays or abandons a game, and
//! checks the events the players saw and the rewards that were paid.

use async_trait::async_trait;
use omok::{
    connection::Connection,
    game::{Color, Coord},
    ledger::LoggingChipLedger,
    reward::{DispatcherConfig, PayoutResult, RewardDispatcher, RewardPayout},
    session::{MatchStatus, MoveOutcome, MoveRejection, RegistryError, SessionConfig, SessionRegistry},
    ServerEvent,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::Receiver;
use tokio::time::timeout;

#[derive(Default)]
struct RecordingPayout {
    paid: Mutex<Vec<String>>,
}

impl RecordingPayout {
    fn paid(&self) -> Vec<String> {
        self.paid.lock().unwrap().clone()
    }
}

#[async_trait]
impl RewardPayout for RecordingPayout {
    async fn pay(&self, address: &str) -> PayoutResult<()> {
        self.paid.lock().unwrap().push(address.to_string());
        Ok(())
    }
}

struct Player {
    conn: Connection,
    events: Receiver<ServerEvent>,
    color: Color,
}

struct Harness {
    registry: SessionRegistry,
    payout: Arc<RecordingPayout>,
}

impl Harness {
    fn new(config: SessionConfig) -> Self {
        let payout = Arc::new(RecordingPayout::default());
        let (rewards, _worker) = RewardDispatcher::spawn(payout.clone(), DispatcherConfig::default());
        let registry = SessionRegistry::new(config, rewards, Arc::new(LoggingChipLedger));
        Self { registry, payout }
    }

    /// Pair two fresh connections and return them as (black, white)
    async fn start_match(&self) -> (Player, Player) {
        let (alice, mut alice_rx) = Connection::channel("alice-wallet", 256);
        let (bob, mut bob_rx) = Connection::channel("bob-wallet", 256);

        let status = self.registry.request_match(alice.clone()).await.unwrap();
        assert_eq!(status, MatchStatus::Waiting);
        let status = self.registry.request_match(bob.clone()).await.unwrap();
        assert!(matches!(status, MatchStatus::Matched(_)));

        let alice_color = wait_for_match(&mut alice_rx).await;
        let bob_color = wait_for_match(&mut bob_rx).await;
        assert_eq!(alice_color, bob_color.opponent());

        let alice = Player {
            conn: alice,
            events: alice_rx,
            color: alice_color,
        };
        let bob = Player {
            conn: bob,
            events: bob_rx,
            color: bob_color,
        };

        if alice_color == Color::Black {
            (alice, bob)
        } else {
            (bob, alice)
        }
    }

    async fn wait_for_rewards(&self, count: u64) {
        let rewards = self.registry.rewards();
        for _ in 0..400 {
            let stats = rewards.stats();
            if stats.enqueued >= count && stats.pending() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("rewards never settled: {:?}", rewards.stats());
    }

    async fn wait_for_no_sessions(&self) {
        for _ in 0..400 {
            if self.registry.active_sessions().await == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("sessions never closed");
    }
}

async fn next_event(events: &mut Receiver<ServerEvent>) -> ServerEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

async fn wait_for_match(events: &mut Receiver<ServerEvent>) -> Color {
    loop {
        if let ServerEvent::MatchStarted { color, .. } = next_event(events).await {
            return color;
        }
    }
}

async fn wait_for_end(events: &mut Receiver<ServerEvent>) -> Option<String> {
    loop {
        if let ServerEvent::SessionEnded { winner } = next_event(events).await {
            return winner;
        }
    }
}

fn slow_turns() -> SessionConfig {
    SessionConfig {
        tick_interval: Duration::from_secs(60),
        ..SessionConfig::default()
    }
}

fn fast_turns() -> SessionConfig {
    SessionConfig {
        turn_duration_ticks: 3,
        tick_interval: Duration::from_millis(10),
        ..SessionConfig::default()
    }
}

#[tokio::test]
async fn test_column_of_five_wins_and_pays_black() {
    let harness = Harness::new(slow_turns());
    let (mut black, mut white) = harness.start_match().await;
    let registry = &harness.registry;
    assert_eq!(black.color, Color::Black);
    assert_eq!(white.color, Color::White);

    for y in 0..4 {
        let outcome = registry
            .submit_move(black.conn.id(), Coord::new(0, y), Color::Black)
            .await
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Placed { next: Color::White });

        let outcome = registry
            .submit_move(white.conn.id(), Coord::new(5, y), Color::White)
            .await
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Placed { next: Color::Black });
    }

    let outcome = registry
        .submit_move(black.conn.id(), Coord::new(0, 4), Color::Black)
        .await
        .unwrap();
    assert_eq!(outcome, MoveOutcome::Won);

    let expected = Some(black.conn.wallet_address().to_string());
    assert_eq!(wait_for_end(&mut black.events).await, expected);
    assert_eq!(wait_for_end(&mut white.events).await, expected);

    harness.wait_for_rewards(1).await;
    harness.wait_for_no_sessions().await;
    assert_eq!(harness.payout.paid(), vec![black.conn.wallet_address().to_string()]);
    assert_eq!(registry.rewards().stats().enqueued, 1);
}

#[tokio::test]
async fn test_refused_moves_reach_the_caller() {
    let harness = Harness::new(slow_turns());
    let (black, white) = harness.start_match().await;
    let registry = &harness.registry;

    let err = registry
        .submit_move(white.conn.id(), Coord::new(0, 0), Color::White)
        .await
        .unwrap_err();
    assert_eq!(err, RegistryError::Rejected(MoveRejection::NotYourTurn));

    let err = registry
        .submit_move(white.conn.id(), Coord::new(0, 0), Color::Black)
        .await
        .unwrap_err();
    assert_eq!(err, RegistryError::Rejected(MoveRejection::NotYourColor));

    let err = registry
        .submit_move(black.conn.id(), Coord::new(15, 0), Color::Black)
        .await
        .unwrap_err();
    assert_eq!(err, RegistryError::Rejected(MoveRejection::OutOfBounds));

    registry
        .submit_move(black.conn.id(), Coord::new(3, 3), Color::Black)
        .await
        .unwrap();
    let err = registry
        .submit_move(white.conn.id(), Coord::new(3, 3), Color::White)
        .await
        .unwrap_err();
    assert_eq!(err, RegistryError::Rejected(MoveRejection::CellOccupied));

    let snapshot = registry.session_snapshot(black.conn.id()).await.unwrap();
    assert_eq!(snapshot.move_count, 1);
    assert_eq!(snapshot.current_color, Color::White);
}

#[tokio::test]
async fn test_timeout_awards_the_waiting_player() {
    let harness = Harness::new(fast_turns());
    let (mut black, mut white) = harness.start_match().await;

    // Black never moves.
    let expected = Some(white.conn.wallet_address().to_string());
    assert_eq!(wait_for_end(&mut white.events).await, expected);

    let mut ticks = Vec::new();
    loop {
        match next_event(&mut black.events).await {
            ServerEvent::TimerTick { remaining } => ticks.push(remaining),
            ServerEvent::SessionEnded { winner } => {
                assert_eq!(winner, expected);
                break;
            }
            _ => {}
        }
    }
    assert_eq!(ticks, vec![2, 1, 0]);

    harness.wait_for_rewards(1).await;
    assert_eq!(harness.payout.paid(), vec![white.conn.wallet_address().to_string()]);
}

#[tokio::test]
async fn test_disconnect_awards_the_survivor() {
    let harness = Harness::new(slow_turns());
    let (black, mut white) = harness.start_match().await;

    let Player {
        conn: black_conn,
        events: black_events,
        ..
    } = black;
    drop(black_events);
    harness.registry.disconnect(black_conn.id()).await;

    let mut saw_opponent_left = false;
    let winner = loop {
        match next_event(&mut white.events).await {
            ServerEvent::OpponentLeft { move_count } => {
                assert_eq!(move_count, 0);
                saw_opponent_left = true;
            }
            ServerEvent::SessionEnded { winner } => break winner,
            _ => {}
        }
    };
    assert!(saw_opponent_left);
    assert_eq!(winner, Some(white.conn.wallet_address().to_string()));

    harness.wait_for_rewards(1).await;
    harness.wait_for_no_sessions().await;
    assert_eq!(harness.payout.paid(), vec![white.conn.wallet_address().to_string()]);

    // The survivor is free to queue again.
    let status = harness.registry.request_match(white.conn.clone()).await.unwrap();
    assert_eq!(status, MatchStatus::Waiting);
}

#[tokio::test]
async fn test_both_disconnect_pays_nothing() {
    let harness = Harness::new(slow_turns());
    let (black, white) = harness.start_match().await;

    let (black_conn, white_conn) = (black.conn, white.conn);
    drop(black.events);
    drop(white.events);

    harness.registry.disconnect(black_conn.id()).await;
    harness.registry.disconnect(white_conn.id()).await;

    harness.wait_for_no_sessions().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(harness.registry.rewards().stats().enqueued, 0);
    assert!(harness.payout.paid().is_empty());
}

#[tokio::test]
async fn test_racing_triggers_pay_exactly_once() {
    let harness = Harness::new(slow_turns());
    let (black, white) = harness.start_match().await;
    let registry = &harness.registry;

    let (black_conn, white_conn) = (black.conn.clone(), white.conn.clone());
    drop(white.events);

    // Every ordering of these leaves black as the winner.
    let (_, _, _) = tokio::join!(
        registry.declare_game_over(black_conn.id(), Color::Black),
        registry.submit_move(black_conn.id(), Coord::new(0, 0), Color::Black),
        registry.disconnect(white_conn.id()),
    );

    harness.wait_for_no_sessions().await;
    harness.wait_for_rewards(1).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let stats = registry.rewards().stats();
    assert_eq!(stats.enqueued, 1);
    assert_eq!(harness.payout.paid(), vec![black_conn.wallet_address().to_string()]);
    drop(black);
}

#[tokio::test]
async fn test_moves_after_close_are_stale() {
    let harness = Harness::new(slow_turns());
    let (black, white) = harness.start_match().await;
    let registry = &harness.registry;

    registry
        .declare_game_over(white.conn.id(), Color::White)
        .await
        .unwrap();
    harness.wait_for_no_sessions().await;

    let err = registry
        .submit_move(black.conn.id(), Coord::new(1, 1), Color::Black)
        .await
        .unwrap_err();
    assert_eq!(err, RegistryError::StaleSession);

    harness.wait_for_rewards(1).await;
    assert_eq!(harness.payout.paid(), vec![white.conn.wallet_address().to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_requeue_right_after_session_ended() {
    for _ in 0..50 {
        let harness = Harness::new(slow_turns());
        let (mut black, white) = harness.start_match().await;

        harness
            .registry
            .declare_game_over(white.conn.id(), Color::White)
            .await
            .unwrap();
        wait_for_end(&mut black.events).await;

        // No waiting for the registry to drop the finished session's routes.
        let status = harness.registry.request_match(black.conn.clone()).await.unwrap();
        assert_eq!(status, MatchStatus::Waiting);
        assert_eq!(harness.registry.waiting_connection(), Some(black.conn.id()));
    }
}
