//! WebSocket handler for player connections.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws?wallet=<address>`
//! 2. Server checks the wallet address and upgrades the connection
//! 3. Server spawns a send task that forwards the connection's
//!    [`ServerEvent`]s as JSON text frames
//! 4. Incoming frames are parsed as [`ClientMessage`]s and routed to the
//!    session registry
//! 5. When either direction ends (client close, read error, or a failed
//!    write) the outbox is dropped and the registry is told the connection
//!    is gone
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:3001/ws?wallet=7xKXtg2CW87d97TX');
//!
//! ws.onmessage = (event) => {
//!   const data = JSON.parse(event.data);
//!   if (data.type === 'match_started') {
//!     startBoard(data.color);
//!   }
//! };
//!
//! ws.send(JSON.stringify({ type: 'start_matching' }));
//! ws.send(JSON.stringify({ type: 'make_move', x: 7, y: 7, color: 'black' }));
//! ```

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{Sink, SinkExt, StreamExt};
use log::{debug, error, info, warn};
use omok::{
    connection::{Connection, DEFAULT_OUTBOX_CAPACITY},
    game::{Color, Coord},
    session::{MatchStatus, RegistryError, ServerEvent},
};
use serde::Deserialize;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc;

use super::AppState;
use crate::{logging, metrics};

/// Longest wallet address accepted on connect
pub const MAX_WALLET_LEN: usize = 128;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    wallet: String,
}

/// Client messages received via WebSocket
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask to be paired with an opponent
    StartMatching,
    /// Place a stone
    MakeMove { x: usize, y: usize, color: Color },
    /// Declare the game over, naming the winner
    GameOver { winner: Color },
}

/// Whether a wallet address is acceptable as a connection identity
pub fn is_valid_wallet(wallet: &str) -> bool {
    let wallet = wallet.trim();
    !wallet.is_empty() && wallet.len() <= MAX_WALLET_LEN
}

/// Upgrade HTTP connection to WebSocket for a player.
///
/// # Query Parameters
///
/// - `wallet`: Player's wallet address, used as the reward destination
///
/// # Response
///
/// On success, upgrades connection to WebSocket protocol (101 Switching Protocols).
/// A missing, empty or overlong wallet address returns `400 Bad Request`.
pub async fn websocket_handler(
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if !is_valid_wallet(&query.wallet) {
        return (StatusCode::BAD_REQUEST, "Invalid wallet address").into_response();
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let wallet = query.wallet.trim().to_string();
    ws.on_upgrade(move |socket| handle_socket(socket, wallet, state))
}

/// Handle an established WebSocket connection until it closes.
async fn handle_socket(socket: WebSocket, wallet: String, state: AppState) {
    let (sender, mut receiver) = socket.split();

    let (connection, events) = Connection::channel(wallet, DEFAULT_OUTBOX_CAPACITY);
    let connection_id = connection.id();

    let open = state.connections.fetch_add(1, Ordering::SeqCst) + 1;
    metrics::websocket_connections_total();
    metrics::websocket_connections_active(open);
    logging::log_connection_event(
        "connected",
        &connection_id.to_string(),
        connection.wallet_address(),
    );

    // Forward session events to the socket
    let mut send_task = tokio::spawn(forward_events(events, sender));

    // Receive messages from client
    let recv_loop = async {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => handle_client_message(client_msg, &connection, &state).await,
                    Err(e) => {
                        warn!("Failed to parse client message from {}: {}", connection_id, e);
                        connection.notify(ServerEvent::Error {
                            message: "Invalid message format".to_string(),
                        });
                    }
                },
                Ok(Message::Close(_)) => {
                    info!("WebSocket closed: connection={}", connection_id);
                    break;
                }
                Err(e) => {
                    warn!("WebSocket error on {}: {}", connection_id, e);
                    break;
                }
                _ => {}
            }
        }
    };

    // A connection that can no longer be written to is treated as gone.
    let send_finished = tokio::select! {
        _ = recv_loop => false,
        _ = &mut send_task => {
            warn!("Outbound stream to {} failed; closing connection", connection_id);
            true
        }
    };

    // The outbox receiver lives in the send task; it must be gone before the
    // registry looks at this connection's liveness.
    if !send_finished {
        send_task.abort();
        let _ = send_task.await;
    }

    state.registry.disconnect(connection_id).await;

    let open = state.connections.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
    metrics::websocket_connections_active(open);
    logging::log_connection_event(
        "disconnected",
        &connection_id.to_string(),
        connection.wallet_address(),
    );
}

/// Write each event to `sink` as a JSON text frame until the outbox closes
/// or a write fails. The outbox receiver is dropped on return.
async fn forward_events<S>(mut events: mpsc::Receiver<ServerEvent>, mut sink: S)
where
    S: Sink<Message> + Unpin,
{
    while let Some(event) = events.recv().await {
        let json = match event.to_json() {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize event: {}", e);
                continue;
            }
        };

        if sink.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}

/// Route one parsed client message to the registry.
///
/// Refused moves and refused match requests are reported back to the
/// sender; events for a session that has already ended are dropped.
async fn handle_client_message(msg: ClientMessage, connection: &Connection, state: &AppState) {
    let connection_id = connection.id();

    match msg {
        ClientMessage::StartMatching => {
            match state.registry.request_match(connection.clone()).await {
                Ok(MatchStatus::Matched(session_id)) => {
                    metrics::sessions_started_total();
                    info!("Connection {} matched into session {}", connection_id, session_id);
                }
                Ok(MatchStatus::Waiting) => {
                    debug!("Connection {} is waiting for an opponent", connection_id);
                }
                Err(e) => {
                    connection.notify(ServerEvent::Error {
                        message: e.to_string(),
                    });
                }
            }
        }

        ClientMessage::MakeMove { x, y, color } => {
            match state
                .registry
                .submit_move(connection_id, Coord::new(x, y), color)
                .await
            {
                Ok(_) => metrics::moves_applied_total(),
                Err(RegistryError::Rejected(rejection)) => {
                    metrics::moves_rejected_total(&format!("{:?}", rejection));
                    connection.notify(ServerEvent::from(rejection));
                }
                Err(e) => debug!("Move from {} ignored: {}", connection_id, e),
            }
        }

        ClientMessage::GameOver { winner } => {
            if let Err(e) = state.registry.declare_game_over(connection_id, winner).await {
                debug!("Game-over from {} ignored: {}", connection_id, e);
            }
        }
    }
}
