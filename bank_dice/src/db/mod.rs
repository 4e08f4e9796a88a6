//! Game persistence.
//!
//! Every committed game transition is written whole to a [`GameStore`].
//! Two stores are provided: [`MemoryGameStore`] for development and tests,
//! and [`PgGameStore`] which keeps one JSONB row per game in PostgreSQL.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod config;
pub mod errors;
pub mod repository;
pub mod timeouts;

pub use config::DatabaseConfig;
pub use errors::{StoreError, StoreResult};
pub use repository::{GameStore, MemoryGameStore, PgGameStore};

/// PostgreSQL pool backing [`PgGameStore`]
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect using the pool limits in `config`.
    ///
    /// Commits run on the game actors' path, so `connection_timeout_secs`
    /// bounds how long a commit can wait for a free connection.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Game store on this pool, with the `games` table created if missing.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use bank_dice::db::{Database, DatabaseConfig, StoreError};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), StoreError> {
    ///     let db = Database::new(&DatabaseConfig::development()).await?;
    ///     let store = db.game_store().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn game_store(&self) -> StoreResult<PgGameStore> {
        let store = PgGameStore::new(self.pool.clone());
        store.ensure_schema().await?;
        Ok(store)
    }
}
