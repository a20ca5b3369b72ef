//! Payout backends.

use async_trait::async_trait;
use tokio::process::Command;

use super::errors::{PayoutError, PayoutResult};

/// External value-transfer action run once per reward request
#[async_trait]
pub trait RewardPayout: Send + Sync {
    /// Transfer the reward to `address`
    async fn pay(&self, address: &str) -> PayoutResult<()>;
}

/// Payout that shells out to a transfer CLI, appending the winner's address
/// as the last argument.
///
/// The default form is `spl-token transfer <mint> <amount> <address>`.
#[derive(Debug, Clone)]
pub struct CommandPayout {
    program: String,
    args: Vec<String>,
}

impl CommandPayout {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `spl-token transfer <mint> <amount>`
    pub fn spl_token(program: impl Into<String>, mint: &str, amount: &str) -> Self {
        Self::new(
            program,
            vec!["transfer".to_string(), mint.to_string(), amount.to_string()],
        )
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl RewardPayout for CommandPayout {
    async fn pay(&self, address: &str) -> PayoutResult<()> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(address)
            .kill_on_drop(true)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(PayoutError::CommandFailed {
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        if !stderr.trim().is_empty() {
            log::warn!("Payout to {} wrote to stderr: {}", address, stderr.trim());
        }
        log::debug!("Payout command output: {}", stdout.trim());

        Ok(())
    }
}
