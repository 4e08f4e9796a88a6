//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use bank_dice::{GameConfig, db::DatabaseConfig};
use std::{net::SocketAddr, str::FromStr, time::Duration};

/// Where committed games are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process only. Games are lost on restart.
    Memory,
    /// One row per game in PostgreSQL
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(ConfigError::Invalid {
                var: "GAME_STORE".to_string(),
                reason: format!("Unknown store '{other}', expected memory or postgres"),
            }),
        }
    }
}

/// Nickname service settings
#[derive(Debug, Clone)]
pub struct NicknameConfig {
    /// Endpoint of the nickname service. Players keep their plain name when unset.
    pub endpoint: Option<String>,
    /// How long a join waits for a nickname before falling back
    pub timeout: Duration,
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    pub store: StoreBackend,
    /// Only present when `DATABASE_URL` is set
    pub database: Option<DatabaseConfig>,
    pub nickname: NicknameConfig,
    /// Defaults for new games
    pub game: GameConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `store_override` - Optional store backend override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        store_override: Option<StoreBackend>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env("SERVER_BIND")?.unwrap_or(SocketAddr::from(([127, 0, 0, 1], 6969))),
        };

        let store = match store_override {
            Some(store) => store,
            None => parse_env("GAME_STORE")?.unwrap_or(StoreBackend::Memory),
        };

        let database = match database_url_override {
            Some(database_url) => Some(DatabaseConfig {
                database_url,
                ..DatabaseConfig::from_env().unwrap_or_default()
            }),
            None => DatabaseConfig::from_env(),
        };

        if store == StoreBackend::Postgres && database.is_none() {
            return Err(ConfigError::MissingRequired {
                var: "DATABASE_URL".to_string(),
                hint: "Required with GAME_STORE=postgres, or pass --db-url".to_string(),
            });
        }

        let nickname = NicknameConfig {
            endpoint: std::env::var("NICKNAME_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            timeout: Duration::from_millis(parse_env_or("NICKNAME_TIMEOUT_MS", 2000)),
        };

        let defaults = GameConfig::default();
        let game = GameConfig {
            num_rounds: parse_env_or("GAME_NUM_ROUNDS", defaults.num_rounds),
            num_players: parse_env_or("GAME_NUM_PLAYERS", defaults.num_players),
            inbox_capacity: parse_env_or("GAME_INBOX_CAPACITY", defaults.inbox_capacity),
            subscriber_buffer: parse_env_or("GAME_SUBSCRIBER_BUFFER", defaults.subscriber_buffer),
            idempotency_window: parse_env_or(
                "GAME_IDEMPOTENCY_WINDOW",
                defaults.idempotency_window,
            ),
        };

        Ok(ServerConfig {
            bind,
            store,
            database,
            nickname,
            game,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.game
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "GAME_*".to_string(),
                reason,
            })?;

        if self.nickname.endpoint.is_some() && self.nickname.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "NICKNAME_TIMEOUT_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if let Some(database) = &self.database
            && database.min_connections > database.max_connections
        {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    database.max_connections
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse an optional environment variable, rejecting values that don't parse
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("Could not parse '{value}'"),
        }),
        Err(_) => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            store: StoreBackend::Memory,
            database: None,
            nickname: NicknameConfig {
                endpoint: None,
                timeout: Duration::from_secs(2),
            },
            game: GameConfig::default(),
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "DATABASE_URL".to_string(),
            hint: "Pass --db-url".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("DATABASE_URL"));
        assert!(msg.contains("Pass --db-url"));
    }

    #[test]
    fn test_store_backend_parsing() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("Postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert!("redis".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_rounds_out_of_range() {
        let mut config = config();
        config.game.num_rounds = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_config_validation_nickname_timeout_zero() {
        let mut config = config();
        config.nickname = NicknameConfig {
            endpoint: Some("http://localhost:9000/nickname".to_string()),
            timeout: Duration::ZERO,
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == "NICKNAME_TIMEOUT_MS"));
    }

    #[test]
    fn test_config_validation_pool_bounds() {
        let mut config = config();
        config.database = Some(DatabaseConfig {
            min_connections: 20,
            max_connections: 5,
            ..DatabaseConfig::development()
        });

        assert!(config.validate().is_err());
    }
}
