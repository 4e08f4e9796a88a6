//! Game instance error types.

use thiserror::Error;

use crate::db::StoreError;
use crate::game::{GameCode, GameError};

#[derive(Debug, Error)]
pub enum InstanceError {
    /// The intent broke a game rule. Nothing was changed.
    #[error(transparent)]
    Game(#[from] GameError),

    /// No live game has this code, or it was deleted.
    #[error("Game {0} not found")]
    NotFound(GameCode),

    /// The new state could not be committed. The game stays at its last
    /// committed version.
    #[error("Commit failed: {0}")]
    Commit(#[from] StoreError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl InstanceError {
    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            InstanceError::Game(err) => err.to_string(),
            InstanceError::NotFound(_) => "Game not found".to_string(),
            InstanceError::Commit(err) => err.client_message(),
            InstanceError::InvalidConfig(reason) => reason.clone(),
        }
    }
}

/// Result type for game instance operations
pub type InstanceResult<T> = Result<T, InstanceError>;
