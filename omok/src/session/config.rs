//! Session configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::constants::{DEFAULT_BOARD_SIZE, DEFAULT_TURN_DURATION_TICKS, WINNING_RUN};

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Board edge length (default: 15)
    pub board_size: usize,

    /// Ticks a player has to move (default: 30)
    pub turn_duration_ticks: u32,

    /// Length of one tick (default: 1 second)
    pub tick_interval: Duration,

    /// Session actor inbox capacity
    pub inbox_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            turn_duration_ticks: DEFAULT_TURN_DURATION_TICKS,
            tick_interval: Duration::from_secs(1),
            inbox_capacity: 64,
        }
    }
}

impl SessionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.board_size < WINNING_RUN || self.board_size > 32 {
            return Err(format!(
                "Board size must be between {} and 32",
                WINNING_RUN
            ));
        }

        if self.turn_duration_ticks == 0 {
            return Err("Turn duration must be at least one tick".to_string());
        }

        if self.tick_interval.is_zero() {
            return Err("Tick interval must be non-zero".to_string());
        }

        if self.inbox_capacity == 0 {
            return Err("Inbox capacity must be non-zero".to_string());
        }

        Ok(())
    }

    /// Full turn length as wall-clock time
    pub fn turn_duration(&self) -> Duration {
        self.tick_interval * self.turn_duration_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.board_size, 15);
        assert_eq!(config.turn_duration(), Duration::from_secs(30));
    }

    #[test]
    fn test_rejects_tiny_board() {
        let config = SessionConfig {
            board_size: 4,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_turn() {
        let config = SessionConfig {
            turn_duration_ticks: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
