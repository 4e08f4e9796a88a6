//! Game instance configuration.

use serde::{Deserialize, Serialize};

use crate::game::constants::{DEFAULT_NUM_ROUNDS, MAX_NUM_ROUNDS, MIN_PLAYERS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Rounds for new games that don't ask for a specific count (default: 10)
    pub num_rounds: u32,

    /// Expected number of players. Only a hint for displays.
    pub num_players: usize,

    /// Intents that can queue up for one game before senders wait
    pub inbox_capacity: usize,

    /// Updates buffered per subscriber before the oldest are dropped
    pub subscriber_buffer: usize,

    /// Recent idempotency keys remembered per game
    pub idempotency_window: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            num_rounds: DEFAULT_NUM_ROUNDS,
            num_players: MIN_PLAYERS,
            inbox_capacity: 100,
            subscriber_buffer: 32,
            idempotency_window: 256,
        }
    }
}

impl GameConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.num_rounds == 0 || self.num_rounds > MAX_NUM_ROUNDS {
            return Err(format!("Rounds must be between 1 and {MAX_NUM_ROUNDS}"));
        }

        if self.inbox_capacity == 0 {
            return Err("Inbox capacity must be at least 1".to_string());
        }

        if self.subscriber_buffer == 0 {
            return Err("Subscriber buffer must be at least 1".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_rounds, 10);
    }

    #[test]
    fn test_rejects_out_of_range_rounds() {
        let config = GameConfig {
            num_rounds: 0,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GameConfig {
            num_rounds: MAX_NUM_ROUNDS + 1,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_buffers() {
        let config = GameConfig {
            subscriber_buffer: 0,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GameConfig {
            inbox_capacity: 0,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
