//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use omok::{reward::DispatcherConfig, session::SessionConfig};
use std::net::SocketAddr;
use std::time::Duration;

/// Default transfer CLI
pub const DEFAULT_REWARD_COMMAND: &str = "spl-token";

/// Default token mint passed to the transfer CLI
pub const DEFAULT_REWARD_MINT: &str = "C3YcZRDATeGZSpkvGryJ7uoyYhD8gxrGei4pVwdcDXx8";

/// Default reward amount per win
pub const DEFAULT_REWARD_AMOUNT: &str = "18";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus exporter address (disabled when unset)
    pub metrics_bind: Option<SocketAddr>,
    /// Per-session settings
    pub session: SessionConfig,
    /// Reward payout settings
    pub reward: RewardConfig,
}

/// Reward payout configuration
#[derive(Debug, Clone)]
pub struct RewardConfig {
    /// Transfer program to run
    pub command: String,
    /// Token mint argument
    pub mint: String,
    /// Amount argument
    pub amount: String,
    /// Upper bound on one payout
    pub payout_timeout: Duration,
}

impl RewardConfig {
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            payout_timeout: self.payout_timeout,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_addr_or("SERVER_BIND", "127.0.0.1:3001")?,
        };

        let metrics_bind = match std::env::var("METRICS_BIND") {
            Ok(value) if !value.trim().is_empty() => {
                Some(value.trim().parse().map_err(|_| ConfigError::Invalid {
                    var: "METRICS_BIND".to_string(),
                    reason: format!("'{}' is not a socket address", value),
                })?)
            }
            _ => None,
        };

        let defaults = SessionConfig::default();
        let session = SessionConfig {
            board_size: parse_env_or("BOARD_SIZE", defaults.board_size),
            turn_duration_ticks: parse_env_or("TURN_DURATION_SECS", defaults.turn_duration_ticks),
            tick_interval: Duration::from_secs(1),
            ..defaults
        };

        let reward = RewardConfig {
            command: std::env::var("REWARD_COMMAND")
                .unwrap_or_else(|_| DEFAULT_REWARD_COMMAND.to_string()),
            mint: std::env::var("REWARD_MINT").unwrap_or_else(|_| DEFAULT_REWARD_MINT.to_string()),
            amount: std::env::var("REWARD_AMOUNT")
                .unwrap_or_else(|_| DEFAULT_REWARD_AMOUNT.to_string()),
            payout_timeout: Duration::from_secs(parse_env_or("PAYOUT_TIMEOUT_SECS", 60)),
        };

        Ok(ServerConfig {
            bind,
            metrics_bind,
            session,
            reward,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.board_size < 5 || self.session.board_size > 32 {
            return Err(ConfigError::Invalid {
                var: "BOARD_SIZE".to_string(),
                reason: "Must be between 5 and 32".to_string(),
            });
        }

        if self.session.turn_duration_ticks == 0 {
            return Err(ConfigError::Invalid {
                var: "TURN_DURATION_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.reward.command.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "REWARD_COMMAND".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if self.reward.payout_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "PAYOUT_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        self.session.validate().map_err(|reason| ConfigError::Invalid {
            var: "session".to_string(),
            reason,
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_addr_or(key: &str, default: &str) -> Result<SocketAddr, ConfigError> {
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("'{}' is not a socket address", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:3001".parse().unwrap(),
            metrics_bind: None,
            session: SessionConfig::default(),
            reward: RewardConfig {
                command: DEFAULT_REWARD_COMMAND.to_string(),
                mint: DEFAULT_REWARD_MINT.to_string(),
                amount: DEFAULT_REWARD_AMOUNT.to_string(),
                payout_timeout: Duration::from_secs(60),
            },
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            var: "BOARD_SIZE".to_string(),
            reason: "Must be between 5 and 32".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("BOARD_SIZE"));
        assert!(msg.contains("between 5 and 32"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_board_too_small() {
        let mut config = valid_config();
        config.session.board_size = 4;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("BOARD_SIZE"));
    }

    #[test]
    fn test_config_validation_board_too_large() {
        let mut config = valid_config();
        config.session.board_size = 33;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_turn() {
        let mut config = valid_config();
        config.session.turn_duration_ticks = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("TURN_DURATION_SECS"));
    }

    #[test]
    fn test_config_validation_empty_command() {
        let mut config = valid_config();
        config.reward.command = "  ".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "REWARD_COMMAND"));
    }

    #[test]
    fn test_bind_override_wins() {
        let bind: SocketAddr = "0.0.0.0:4000".parse().unwrap();
        let config = ServerConfig::from_env(Some(bind)).unwrap();
        assert_eq!(config.bind, bind);
    }
}
