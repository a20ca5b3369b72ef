//! Session module providing one async actor per two-player game.
//!
//! This module implements:
//! - GameSession: Board, turn order, timer and termination state machine
//! - SessionActor: Async actor driving a single GameSession
//! - SessionRegistry: Matchmaking and connection-to-session routing
//! - TurnTimer: Per-turn countdown feeding ticks into the session inbox
//!
//! ## Architecture
//!
//! Each session runs in a separate Tokio task with an mpsc message inbox.
//! Moves, disconnects, explicit game-over messages and timer ticks all pass
//! through that inbox, so a session never sees two events at once. A session
//! moves `Active -> Terminating -> Closed` exactly once; only the first
//! trigger decides the outcome, and closing enqueues at most one reward.
//!
//! ## Example
//!
//! ```no_run
//! use omok::{
//!     connection::Connection,
//!     ledger::LoggingChipLedger,
//!     reward::{CommandPayout, DispatcherConfig, RewardDispatcher},
//!     session::{SessionConfig, SessionRegistry},
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let payout = Arc::new(CommandPayout::new("true", vec![]));
//!     let (rewards, _worker) = RewardDispatcher::spawn(payout, DispatcherConfig::default());
//!     let registry = SessionRegistry::new(
//!         SessionConfig::default(),
//!         rewards,
//!         Arc::new(LoggingChipLedger),
//!     );
//!
//!     let (alice, _alice_events) = Connection::channel("alice-wallet", 64);
//!     let (bob, _bob_events) = Connection::channel("bob-wallet", 64);
//!     registry.request_match(alice).await.unwrap();
//!     registry.request_match(bob).await.unwrap();
//! }
//! ```

use uuid::Uuid;

pub mod actor;
pub mod config;
pub mod messages;
pub mod registry;
pub mod state;
pub mod timer;

/// Unique session identifier
pub type SessionId = Uuid;

pub use actor::{SessionActor, SessionHandle};
pub use config::SessionConfig;
pub use messages::{
    MoveOutcome, MoveRejection, ServerEvent, SessionMessage, SessionSnapshot, SessionStatus,
    SessionSummary, TerminationReason,
};
pub use registry::{MatchStatus, RegistryError, SessionRegistry};
pub use state::GameSession;
pub use timer::TurnTimer;
