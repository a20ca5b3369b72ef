//! # Omok
//!
//! Core of a two-player omok (five-in-a-row) service using an async actor
//! per game session.
//!
//! Players connect, ask for an opponent, and are paired first come first
//! served. Each pair gets a session with a square board, alternating turns
//! starting with black, and a per-turn countdown. A session ends exactly
//! once, by a winning move, a timeout, an explicit game-over message, or a
//! disconnect, and the winner's wallet address is queued for a reward. A
//! single dispatcher worker pays rewards out one at a time in arrival order.
//!
//! ## Core Modules
//!
//! - [`game`]: Board, colors, coordinates and the exact-five win rule
//! - [`matchmaking`]: Single-slot pairing queue with random color assignment
//! - [`session`]: Session state machine, actor, turn timer and registry
//! - [`reward`]: Sequential reward dispatcher and payout backends
//! - [`connection`]: Per-connection outbound event channel
//! - [`ledger`]: Chip debit seam called when a session starts
//!
//! ## Example
//!
//! ```
//! use omok::game::{Board, Color, Coord, is_winning_move};
//!
//! let mut board = Board::new(15);
//! for y in 0..5 {
//!     board.place(Coord::new(7, y), Color::Black);
//! }
//! assert!(is_winning_move(&board, Coord::new(7, 4), Color::Black));
//! ```

/// Per-connection outbound channel.
pub mod connection;

/// Board, colors, coordinates and win detection.
pub mod game;
pub use game::{
    Board, Color, Coord,
    constants::{self, DEFAULT_BOARD_SIZE, DEFAULT_TURN_DURATION_TICKS, WINNING_RUN},
    is_winning_move,
};

/// Chip debit seam.
pub mod ledger;

/// Pairing of waiting connections.
pub mod matchmaking;

/// Sequential reward payouts.
pub mod reward;
pub use reward::{RewardDispatcher, RewardRequest};

/// Game sessions and the registry that routes to them.
pub mod session;
pub use session::{ServerEvent, SessionConfig, SessionRegistry};
