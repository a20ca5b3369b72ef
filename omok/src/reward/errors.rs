//! Reward payout error types.

use std::time::Duration;
use thiserror::Error;

/// Payout errors
#[derive(Debug, Error)]
pub enum PayoutError {
    /// Payout program could not be started
    #[error("Failed to start payout command: {0}")]
    Spawn(#[from] std::io::Error),

    /// Payout program exited unsuccessfully
    #[error("Payout command exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    /// Payout did not resolve in time
    #[error("Payout timed out after {0:?}")]
    Timeout(Duration),

    /// Payout backend refused the transfer
    #[error("Payout rejected: {0}")]
    Rejected(String),
}

impl PayoutError {
    /// Whether the failure happened before anything reached the payout backend
    pub fn is_local(&self) -> bool {
        matches!(self, PayoutError::Spawn(_))
    }
}

/// Result type for payout operations
pub type PayoutResult<T> = Result<T, PayoutError>;
