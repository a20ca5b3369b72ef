//! WebSocket integration tests for real-time omok play.
//!
//! Runs the router on a local port and drives it with real WebSocket clients.

use futures_util::{SinkExt, StreamExt};
use omok::{
    ledger::LoggingChipLedger,
    reward::{CommandPayout, DispatcherConfig, RewardDispatcher},
    session::{SessionConfig, SessionRegistry},
};
use omok_server::api::{AppState, create_router};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Helper to start a server on an ephemeral port
async fn start_server() -> (SocketAddr, Arc<SessionRegistry>) {
    let payout = Arc::new(CommandPayout::new("true", vec![]));
    let (rewards, _worker) = RewardDispatcher::spawn(payout, DispatcherConfig::default());
    let registry = Arc::new(SessionRegistry::new(
        SessionConfig::default(),
        rewards,
        Arc::new(LoggingChipLedger),
    ));

    let app = create_router(AppState::new(registry.clone()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, registry)
}

async fn connect(addr: SocketAddr, wallet: &str) -> Client {
    let (ws, _) = connect_async(format!("ws://{}/ws?wallet={}", addr, wallet))
        .await
        .expect("Failed to connect to WebSocket");
    ws
}

async fn send(client: &mut Client, value: Value) {
    client.send(Message::text(value.to_string())).await.unwrap();
}

/// Next JSON event from the server
async fn next_event(client: &mut Client) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for server event")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

/// Skip events until one of the given type arrives
async fn wait_for(client: &mut Client, kind: &str) -> Value {
    loop {
        let event = next_event(client).await;
        if event["type"] == kind {
            return event;
        }
    }
}

/// Connect two players and return them as (black, white)
async fn start_match(addr: SocketAddr) -> (Client, Client) {
    let mut alice = connect(addr, "alice-wallet").await;
    send(&mut alice, json!({"type": "start_matching"})).await;
    assert_eq!(wait_for(&mut alice, "waiting").await["type"], "waiting");

    let mut bob = connect(addr, "bob-wallet").await;
    send(&mut bob, json!({"type": "start_matching"})).await;

    let alice_color = wait_for(&mut alice, "match_started").await["color"].clone();
    let bob_color = wait_for(&mut bob, "match_started").await["color"].clone();
    assert_ne!(alice_color, bob_color);

    if alice_color == "black" {
        (alice, bob)
    } else {
        (bob, alice)
    }
}

async fn wait_until(registry: &SessionRegistry, sessions: usize) {
    for _ in 0..400 {
        if registry.active_sessions().await == sessions {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {} active sessions", sessions);
}

#[tokio::test]
async fn test_full_game_over_websocket() {
    let (addr, registry) = start_server().await;
    let (mut black, mut white) = start_match(addr).await;
    wait_until(&registry, 1).await;

    for y in 0..4 {
        send(&mut black, json!({"type": "make_move", "x": 0, "y": y, "color": "black"})).await;
        let expected = json!({"type": "move_applied", "x": 0, "y": y, "color": "black"});
        assert_eq!(wait_for(&mut black, "move_applied").await, expected);
        assert_eq!(wait_for(&mut white, "move_applied").await, expected);

        send(&mut white, json!({"type": "make_move", "x": 5, "y": y, "color": "white"})).await;
        let expected = json!({"type": "move_applied", "x": 5, "y": y, "color": "white"});
        assert_eq!(wait_for(&mut black, "move_applied").await, expected);
        assert_eq!(wait_for(&mut white, "move_applied").await, expected);
    }

    send(&mut black, json!({"type": "make_move", "x": 0, "y": 4, "color": "black"})).await;

    let ended = wait_for(&mut white, "session_ended").await;
    let winner = ended["winner"].as_str().unwrap().to_string();
    let ended = wait_for(&mut black, "session_ended").await;
    assert_eq!(ended["winner"], winner.as_str());

    wait_until(&registry, 0).await;
    assert!(winner == "alice-wallet" || winner == "bob-wallet");
}

#[tokio::test]
async fn test_rejected_move_is_reported() {
    let (addr, _registry) = start_server().await;
    let (_black, mut white) = start_match(addr).await;

    send(&mut white, json!({"type": "make_move", "x": 1, "y": 1, "color": "white"})).await;
    let rejected = wait_for(&mut white, "move_rejected").await;
    assert_eq!(rejected["reason"], "Not your turn");
}

#[tokio::test]
async fn test_malformed_frame_gets_error_event() {
    let (addr, _registry) = start_server().await;
    let mut client = connect(addr, "carol-wallet").await;

    client.send(Message::text("{\"type\":\"resign\"}")).await.unwrap();
    let error = wait_for(&mut client, "error").await;
    assert_eq!(error["message"], "Invalid message format");
}

#[tokio::test]
async fn test_closing_socket_hands_win_to_opponent() {
    let (addr, registry) = start_server().await;
    let (mut black, mut white) = start_match(addr).await;
    wait_until(&registry, 1).await;

    black.close(None).await.unwrap();

    let left = wait_for(&mut white, "opponent_left").await;
    assert_eq!(left["move_count"], 0);
    let ended = wait_for(&mut white, "session_ended").await;
    assert!(ended["winner"].is_string());

    wait_until(&registry, 0).await;
}
