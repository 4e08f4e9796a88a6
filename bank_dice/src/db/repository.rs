//! Game store trait and its implementations.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use super::errors::StoreResult;
use super::timeouts::{DEFAULT_QUERY_TIMEOUT, LONG_OPERATION_TIMEOUT, with_timeout};
use crate::game::{GameCode, GameRecord};

/// Authoritative storage for game snapshots, one record per game code.
///
/// A commit overwrites the whole record. Only the game's own actor writes
/// to its record, so there is no need for compare-and-swap.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Fetch the last committed record for a game
    async fn load(&self, code: &GameCode) -> StoreResult<Option<GameRecord>>;

    /// Persist a record, replacing any previous one for the same code
    async fn commit(&self, record: &GameRecord) -> StoreResult<()>;

    /// Remove a game. Returns whether a record existed.
    async fn delete(&self, code: &GameCode) -> StoreResult<bool>;

    /// Every stored record, used to bring games back after a restart
    async fn list(&self) -> StoreResult<Vec<GameRecord>>;
}

/// In-process store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryGameStore {
    records: RwLock<HashMap<GameCode, GameRecord>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl GameStore for MemoryGameStore {
    async fn load(&self, code: &GameCode) -> StoreResult<Option<GameRecord>> {
        Ok(self.records.read().await.get(code).cloned())
    }

    async fn commit(&self, record: &GameRecord) -> StoreResult<()> {
        self.records
            .write()
            .await
            .insert(record.code.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, code: &GameCode) -> StoreResult<bool> {
        Ok(self.records.write().await.remove(code).is_some())
    }

    async fn list(&self) -> StoreResult<Vec<GameRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}

/// PostgreSQL store keeping each game as a JSONB document.
pub struct PgGameStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgGameStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    /// Create the `games` table if it doesn't exist yet
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        with_timeout(
            LONG_OPERATION_TIMEOUT,
            sqlx::query(
                "CREATE TABLE IF NOT EXISTS games (
                    code TEXT PRIMARY KEY,
                    state JSONB NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )",
            )
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl GameStore for PgGameStore {
    async fn load(&self, code: &GameCode) -> StoreResult<Option<GameRecord>> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query("SELECT state FROM games WHERE code = $1")
                .bind(code.as_str())
                .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => {
                let state: serde_json::Value = row.try_get("state")?;
                Ok(Some(serde_json::from_value(state)?))
            }
            None => Ok(None),
        }
    }

    async fn commit(&self, record: &GameRecord) -> StoreResult<()> {
        let state = serde_json::to_value(record)?;
        with_timeout(
            self.query_timeout,
            sqlx::query(
                "INSERT INTO games (code, state, updated_at) VALUES ($1, $2, NOW())
                 ON CONFLICT (code) DO UPDATE SET state = EXCLUDED.state, updated_at = NOW()",
            )
            .bind(record.code.as_str())
            .bind(state)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, code: &GameCode) -> StoreResult<bool> {
        let result = with_timeout(
            self.query_timeout,
            sqlx::query("DELETE FROM games WHERE code = $1")
                .bind(code.as_str())
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> StoreResult<Vec<GameRecord>> {
        let rows = with_timeout(
            LONG_OPERATION_TIMEOUT,
            sqlx::query("SELECT state FROM games ORDER BY updated_at")
                .fetch_all(&self.pool),
        )
        .await?;

        rows.into_iter()
            .map(|row| -> StoreResult<GameRecord> {
                let state: serde_json::Value = row.try_get("state")?;
                Ok(serde_json::from_value(state)?)
            })
            .collect()
    }
}
