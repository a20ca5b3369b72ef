//! Session registry: pairs connections, spawns session actors, and routes
//! connection events to them.

use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use super::{
    SessionId,
    actor::{SessionActor, SessionHandle},
    config::SessionConfig,
    messages::{
        MoveOutcome, MoveRejection, ServerEvent, SessionMessage, SessionSnapshot, SessionSummary,
    },
};
use crate::{
    connection::{Connection, ConnectionId},
    game::{Color, Coord},
    ledger::ChipLedger,
    matchmaking::{MatchOutcome, MatchmakingQueue, Pairing},
    reward::RewardDispatcher,
};

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Event for a connection with no live session
    #[error("No active session for this connection")]
    StaleSession,

    /// Match request from a connection that is already playing
    #[error("Connection is already in a session")]
    AlreadyInSession,

    /// The session refused the move
    #[error("Move rejected: {0}")]
    Rejected(#[from] MoveRejection),
}

/// Result of a match request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Waiting,
    Matched(SessionId),
}

/// Registry owning the matchmaking slot and every live session
pub struct SessionRegistry {
    /// Configuration handed to each new session
    config: SessionConfig,

    /// Waiting slot
    queue: MatchmakingQueue,

    /// Connection -> session routing
    routes: Arc<RwLock<HashMap<ConnectionId, SessionHandle>>>,

    /// Reward dispatcher handle passed to every session
    rewards: RewardDispatcher,

    /// Chip debit on session start
    ledger: Arc<dyn ChipLedger>,

    /// Summaries of closed sessions
    summaries: broadcast::Sender<SessionSummary>,
}

/// Capacity of the closed-session summary channel
const SUMMARY_CHANNEL_CAPACITY: usize = 256;

impl SessionRegistry {
    /// Create a new session registry
    ///
    /// # Arguments
    ///
    /// * `config` - Session configuration
    /// * `rewards` - Reward dispatcher handle
    /// * `ledger` - Chip ledger debited when a session starts
    pub fn new(
        config: SessionConfig,
        rewards: RewardDispatcher,
        ledger: Arc<dyn ChipLedger>,
    ) -> Self {
        let (summaries, _) = broadcast::channel(SUMMARY_CHANNEL_CAPACITY);
        Self {
            config,
            queue: MatchmakingQueue::new(),
            routes: Arc::new(RwLock::new(HashMap::new())),
            rewards,
            ledger,
            summaries,
        }
    }

    /// Receive a summary for every session that closes from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SessionSummary> {
        self.summaries.subscribe()
    }

    /// Ask for an opponent.
    ///
    /// The first caller waits; the next one is paired with it and a session
    /// actor is spawned for the pair.
    pub async fn request_match(&self, connection: Connection) -> Result<MatchStatus, RegistryError> {
        let in_session = self
            .routes
            .read()
            .await
            .get(&connection.id())
            .is_some_and(|handle| !handle.is_closed());
        if in_session {
            return Err(RegistryError::AlreadyInSession);
        }

        match self.queue.request_match(connection.clone()) {
            MatchOutcome::Waiting => {
                connection.notify(ServerEvent::Waiting);
                Ok(MatchStatus::Waiting)
            }
            MatchOutcome::Matched(pairing) => {
                let session_id = self.spawn_session(pairing).await;
                Ok(MatchStatus::Matched(session_id))
            }
        }
    }

    /// Route a move to the connection's session
    pub async fn submit_move(
        &self,
        connection_id: ConnectionId,
        at: Coord,
        color: Color,
    ) -> Result<MoveOutcome, RegistryError> {
        let handle = self.route(connection_id).await?;
        match handle.submit_move(connection_id, color, at).await {
            Some(result) => Ok(result?),
            None => Err(RegistryError::StaleSession),
        }
    }

    /// Route an explicit game-over to the connection's session
    pub async fn declare_game_over(
        &self,
        connection_id: ConnectionId,
        winner: Color,
    ) -> Result<(), RegistryError> {
        let handle = self.route(connection_id).await?;
        handle
            .send(SessionMessage::DeclareGameOver {
                connection_id,
                winner,
            })
            .await
            .map_err(|_| RegistryError::StaleSession)
    }

    /// Handle a transport disconnect.
    ///
    /// Clears the matchmaking slot if the connection was waiting; otherwise
    /// detaches it from its session, which may hand the win to the opponent.
    pub async fn disconnect(&self, connection_id: ConnectionId) {
        if self.queue.cancel_if_waiting(connection_id) {
            return;
        }

        let handle = self.routes.write().await.remove(&connection_id);
        if let Some(handle) = handle {
            if handle
                .send(SessionMessage::Leave { connection_id })
                .await
                .is_err()
            {
                log::debug!(
                    "Connection {} left session {} after it closed",
                    connection_id,
                    handle.session_id()
                );
            }
        }
    }

    /// Snapshot of the connection's current session
    pub async fn session_snapshot(
        &self,
        connection_id: ConnectionId,
    ) -> Result<SessionSnapshot, RegistryError> {
        let handle = self.route(connection_id).await?;
        handle.snapshot().await.ok_or(RegistryError::StaleSession)
    }

    /// Number of sessions with at least one routed connection
    pub async fn active_sessions(&self) -> usize {
        let routes = self.routes.read().await;
        let mut ids: Vec<SessionId> = routes.values().map(SessionHandle::session_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Connection currently waiting for an opponent
    pub fn waiting_connection(&self) -> Option<ConnectionId> {
        self.queue.waiting()
    }

    pub fn rewards(&self) -> &RewardDispatcher {
        &self.rewards
    }

    async fn route(&self, connection_id: ConnectionId) -> Result<SessionHandle, RegistryError> {
        let routes = self.routes.read().await;
        match routes.get(&connection_id) {
            Some(handle) if !handle.is_closed() => Ok(handle.clone()),
            _ => Err(RegistryError::StaleSession),
        }
    }

    /// Create, register and spawn the actor for a fresh pairing
    async fn spawn_session(&self, pairing: Pairing) -> SessionId {
        let session_id = Uuid::new_v4();
        let (actor, handle) =
            SessionActor::new(session_id, &self.config, pairing.clone(), self.rewards.clone());

        let mut routes = self.routes.write().await;
        routes.insert(pairing.black.id(), handle.clone());
        routes.insert(pairing.white.id(), handle.clone());
        drop(routes);

        // Spawn actor task; its routes are dropped once it closes
        let routes = self.routes.clone();
        let summaries = self.summaries.clone();
        tokio::spawn(async move {
            let summary = actor.run().await;
            routes
                .write()
                .await
                .retain(|_, h| h.session_id() != summary.session_id);
            log::info!(
                "Session {} finished: {} after {} moves, winner {}",
                summary.session_id,
                summary.reason,
                summary.move_count,
                summary.winner.as_deref().unwrap_or("none")
            );
            // No subscribers is fine
            let _ = summaries.send(summary);
        });

        let ledger = self.ledger.clone();
        let wallets = pairing.wallet_addresses();
        tokio::spawn(async move {
            if let Err(e) = ledger.consume_chips(&wallets).await {
                log::error!("Session {}: chip debit failed: {}", session_id, e);
            }
        });

        // A player whose transport died while being paired never reports a
        // disconnect for this session.
        for conn in [&pairing.black, &pairing.white] {
            if !conn.is_live() {
                self.disconnect(conn.id()).await;
            }
        }

        log::info!("Created and spawned session {}", session_id);
        session_id
    }
}
