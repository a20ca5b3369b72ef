//! Session actor message types and outbound client events.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;

use super::SessionId;
use crate::connection::ConnectionId;
use crate::game::{Color, Coord};

/// Messages that can be sent to a SessionActor
#[derive(Debug)]
pub enum SessionMessage {
    /// Place a stone
    SubmitMove {
        connection_id: ConnectionId,
        color: Color,
        at: Coord,
        response: oneshot::Sender<Result<MoveOutcome, MoveRejection>>,
    },

    /// Explicit game-over naming a winner
    DeclareGameOver {
        connection_id: ConnectionId,
        winner: Color,
    },

    /// A participant's transport went away
    Leave { connection_id: ConnectionId },

    /// Internal: one turn-timer tick (sent by the session's own timer)
    Tick { generation: u64 },

    /// Get a point-in-time view of the session
    GetSnapshot {
        response: oneshot::Sender<SessionSnapshot>,
    },
}

/// Result of an accepted move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Stone placed, turn passes to `next`
    Placed { next: Color },
    /// Stone placed and completed exactly five
    Won,
}

/// Why a move was refused. Refused moves never change session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveRejection {
    #[error("Session is not active")]
    SessionNotActive,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("That color does not belong to you")]
    NotYourColor,

    #[error("Coordinates are off the board")]
    OutOfBounds,

    #[error("Cell is already occupied")]
    CellOccupied,
}

/// Session lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Terminating,
    Closed,
}

/// What ended a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    Win,
    Timeout,
    Forfeit,
    Disconnect,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::Win => write!(f, "win"),
            TerminationReason::Timeout => write!(f, "timeout"),
            TerminationReason::Forfeit => write!(f, "forfeit"),
            TerminationReason::Disconnect => write!(f, "disconnect"),
        }
    }
}

/// Point-in-time view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub current_color: Color,
    pub time_left: u32,
    pub move_count: usize,
    pub black_wallet: String,
    pub white_wallet: String,
}

/// Final record returned by a session actor once it has closed
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub reason: TerminationReason,
    pub winner: Option<String>,
    pub move_count: usize,
}

/// Events pushed to a client connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Parked in the matchmaking slot
    Waiting,

    /// Paired; `color` is this connection's color
    MatchStarted { session_id: SessionId, color: Color },

    /// A stone was placed
    MoveApplied { x: usize, y: usize, color: Color },

    /// The connection's own move was refused
    MoveRejected { reason: String },

    /// Seconds (ticks) left for the player to move
    TimerTick { remaining: u32 },

    /// Session over; `winner` is a wallet address
    SessionEnded { winner: Option<String> },

    /// The opponent disconnected mid-game
    OpponentLeft { move_count: usize },

    /// Malformed or refused request
    Error { message: String },
}

impl ServerEvent {
    /// Serialize to the JSON wire form
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<MoveRejection> for ServerEvent {
    fn from(reason: MoveRejection) -> Self {
        ServerEvent::MoveRejected {
            reason: reason.to_string(),
        }
    }
}
