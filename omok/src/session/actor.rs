//! Session actor implementation with async message handling.

use tokio::sync::{mpsc, oneshot};

use super::{
    SessionId,
    config::SessionConfig,
    messages::{
        MoveOutcome, MoveRejection, SessionMessage, SessionSnapshot, SessionStatus,
        SessionSummary, TerminationReason,
    },
    state::GameSession,
};
use crate::{
    connection::ConnectionId,
    game::{Color, Coord},
    matchmaking::Pairing,
    reward::RewardDispatcher,
};

/// Session actor handle for sending messages
#[derive(Debug, Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
    session_id: SessionId,
}

impl SessionHandle {
    /// Create a new session handle
    pub fn new(sender: mpsc::Sender<SessionMessage>, session_id: SessionId) -> Self {
        Self { sender, session_id }
    }

    /// Get session ID
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Whether the actor has stopped accepting messages
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the session
    pub async fn send(&self, message: SessionMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Session is closed".to_string())
    }

    /// Submit a move and wait for the verdict. `None` if the session is gone.
    pub async fn submit_move(
        &self,
        connection_id: ConnectionId,
        color: Color,
        at: Coord,
    ) -> Option<Result<MoveOutcome, MoveRejection>> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionMessage::SubmitMove {
            connection_id,
            color,
            at,
            response: tx,
        })
        .await
        .ok()?;
        rx.await.ok()
    }

    /// Get a snapshot. `None` if the session is gone.
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionMessage::GetSnapshot { response: tx })
            .await
            .ok()?;
        rx.await.ok()
    }
}

/// Session actor owning a single game
pub struct SessionActor {
    /// Game state machine
    session: GameSession,

    /// Message inbox (also fed by the session's turn timer)
    inbox: mpsc::Receiver<SessionMessage>,

    /// Where the winner's reward goes
    rewards: RewardDispatcher,
}

impl SessionActor {
    /// Create a new session actor
    ///
    /// # Arguments
    ///
    /// * `id` - Session ID
    /// * `config` - Session configuration
    /// * `pairing` - The two paired connections
    /// * `rewards` - Reward dispatcher handle
    ///
    /// # Returns
    ///
    /// * `(SessionActor, SessionHandle)` - Actor and handle for sending messages
    pub fn new(
        id: SessionId,
        config: &SessionConfig,
        pairing: Pairing,
        rewards: RewardDispatcher,
    ) -> (Self, SessionHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity);

        let session = GameSession::new(id, config, pairing, sender.clone());
        let actor = Self {
            session,
            inbox,
            rewards,
        };

        (actor, SessionHandle::new(sender, id))
    }

    /// Run the session until it closes
    pub async fn run(mut self) -> SessionSummary {
        let id = self.session.id();
        self.session.start();

        while self.session.status() == SessionStatus::Active {
            match self.inbox.recv().await {
                Some(message) => self.handle_message(message),
                None => break,
            }
        }

        // Only reachable while Active if every sender is gone.
        self.session
            .force_terminate(TerminationReason::Disconnect, None);

        // Handles report closed before the players hear the session ended.
        self.inbox.close();

        let summary = match self.session.close(&self.rewards) {
            Some(summary) => summary,
            None => SessionSummary {
                session_id: id,
                reason: self
                    .session
                    .termination_reason()
                    .unwrap_or(TerminationReason::Disconnect),
                winner: self.session.winner_address().map(str::to_string),
                move_count: self.session.board().stone_count(),
            },
        };

        // Refuse whatever is still queued; pending move callers see the
        // session as gone.
        while let Ok(message) = self.inbox.try_recv() {
            if let SessionMessage::SubmitMove { response, .. } = message {
                let _ = response.send(Err(MoveRejection::SessionNotActive));
            }
        }

        summary
    }

    /// Handle a session message
    fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::SubmitMove {
                connection_id,
                color,
                at,
                response,
            } => {
                let result = self.session.apply_move(connection_id, color, at);
                if let Err(reason) = &result {
                    log::debug!(
                        "Session {}: move {} by {} refused: {}",
                        self.session.id(),
                        at,
                        color,
                        reason
                    );
                }
                let _ = response.send(result);
            }

            SessionMessage::DeclareGameOver {
                connection_id,
                winner,
            } => {
                self.session.declare_game_over(connection_id, winner);
            }

            SessionMessage::Leave { connection_id } => {
                self.session.leave(connection_id);
            }

            SessionMessage::Tick { generation } => {
                self.session.on_tick(generation);
            }

            SessionMessage::GetSnapshot { response } => {
                let _ = response.send(self.session.snapshot());
            }
        }
    }
}
