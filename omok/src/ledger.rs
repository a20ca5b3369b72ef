//! Chip ledger seam.
//!
//! Every session start debits one chip from each participant. The balance
//! store lives outside this crate; the registry calls the ledger once per
//! session, off the session's critical path, and only logs failures.

use async_trait::async_trait;
use thiserror::Error;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Chip debit failed for {address}: {reason}")]
    DebitFailed { address: String, reason: String },
}

/// External chip-balance service
#[async_trait]
pub trait ChipLedger: Send + Sync {
    /// Debit one chip from each wallet address
    async fn consume_chips(&self, wallet_addresses: &[String]) -> Result<(), LedgerError>;
}

/// Ledger that only records the debit in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingChipLedger;

#[async_trait]
impl ChipLedger for LoggingChipLedger {
    async fn consume_chips(&self, wallet_addresses: &[String]) -> Result<(), LedgerError> {
        for address in wallet_addresses {
            log::info!("Consumed one chip from {}", address);
        }
        Ok(())
    }
}
