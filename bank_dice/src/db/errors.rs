//! Game store error types.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// The backing store refused the write or can't be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Message safe to show a client. Database and serialization details
    /// stay in the server logs.
    pub fn client_message(&self) -> String {
        match self {
            StoreError::Database(_) | StoreError::Serialization(_) => {
                "Game could not be saved".to_string()
            }
            StoreError::Timeout(_) | StoreError::Unavailable(_) => {
                "Game store unavailable, try again".to_string()
            }
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
