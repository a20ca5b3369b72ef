//! Reward module: sequential payout of session winners.
//!
//! This module implements:
//! - RewardDispatcher: FIFO queue drained by a single worker task
//! - RewardPayout: the external value-transfer seam
//! - CommandPayout: payout through a transfer CLI such as `spl-token`
//!
//! ## Example
//!
//! ```no_run
//! use omok::reward::{CommandPayout, DispatcherConfig, RewardDispatcher, RewardRequest};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let payout = Arc::new(CommandPayout::spl_token("spl-token", "MintAddress", "18"));
//!     let (dispatcher, _worker) = RewardDispatcher::spawn(payout, DispatcherConfig::default());
//!
//!     dispatcher.enqueue(RewardRequest::new("WinnerWalletAddress"));
//! }
//! ```

pub mod dispatcher;
pub mod errors;
pub mod payout;

pub use dispatcher::{DispatcherConfig, DispatcherStats, RewardDispatcher, RewardRequest};
pub use errors::{PayoutError, PayoutResult};
pub use payout::{CommandPayout, RewardPayout};
