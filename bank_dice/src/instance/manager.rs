//! Game manager for spawning and managing game actors.

use serde::Serialize;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    actor::{GameActor, GameHandle},
    config::GameConfig,
    errors::{InstanceError, InstanceResult},
    messages::{GameUpdate, Intent, IntentOutcome},
    subscription::Subscription,
};
use crate::db::GameStore;
use crate::game::{
    GameCode, GameError, GameRecord, GameState, constants::MAX_NUM_ROUNDS,
    entities::pick_game_code,
};
use crate::nickname::{NicknameService, resolve_nickname};

/// Game summary for discovery
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub code: GameCode,
    pub player_count: usize,
    pub num_rounds: u32,
    pub rounds_left: u32,
    pub game_started: bool,
    pub game_over: bool,
}

impl From<&GameUpdate> for GameSummary {
    fn from(update: &GameUpdate) -> Self {
        Self {
            code: update.state.code.clone(),
            player_count: update.state.players.len(),
            num_rounds: update.state.num_rounds,
            rounds_left: update.state.rounds_left,
            game_started: update.state.game_started,
            game_over: update.state.game_over,
        }
    }
}

/// Game manager for managing multiple game instances
pub struct GameManager {
    store: Arc<dyn GameStore>,

    config: GameConfig,

    /// Live game handles
    games: Arc<RwLock<HashMap<GameCode, GameHandle>>>,

    /// Codes picked for games whose first commit is still in flight
    reserved: Arc<RwLock<HashSet<GameCode>>>,

    nicknames: Option<Arc<dyn NicknameService>>,

    nickname_timeout: Duration,
}

impl GameManager {
    pub fn new(store: Arc<dyn GameStore>, config: GameConfig) -> Self {
        Self {
            store,
            config,
            games: Arc::new(RwLock::new(HashMap::new())),
            reserved: Arc::new(RwLock::new(HashSet::new())),
            nicknames: None,
            nickname_timeout: Duration::from_secs(2),
        }
    }

    /// Generate nicknames for joining players with `service`, falling back
    /// to their plain name after `timeout`.
    pub fn with_nickname_service(
        mut self,
        service: Arc<dyn NicknameService>,
        timeout: Duration,
    ) -> Self {
        self.nicknames = Some(service);
        self.nickname_timeout = timeout;
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Respawn an actor for every game in the store.
    ///
    /// Records that don't describe a valid game are skipped with a warning.
    ///
    /// # Returns
    ///
    /// Number of games loaded
    pub async fn load_existing_games(&self) -> InstanceResult<usize> {
        let records = self.store.list().await?;
        let mut games = self.games.write().await;
        let mut loaded = 0;

        for record in records {
            let code = record.code.clone();
            if games.contains_key(&code) {
                continue;
            }
            match GameState::try_from(record) {
                Ok(state) => {
                    games.insert(code.clone(), self.spawn(state));
                    log::info!("Loaded existing game {}", code);
                    loaded += 1;
                }
                Err(e) => log::warn!("Skipping stored game {}: {}", code, e),
            }
        }

        Ok(loaded)
    }

    /// Create, commit, and spawn a new game in the lobby.
    ///
    /// Uses the configured round count when `num_rounds` is `None`.
    pub async fn create_game(&self, num_rounds: Option<u32>) -> InstanceResult<GameCode> {
        let num_rounds = num_rounds.unwrap_or(self.config.num_rounds);
        if !(1..=MAX_NUM_ROUNDS).contains(&num_rounds) {
            return Err(GameError::InvalidRoundCount {
                got: num_rounds,
                max: MAX_NUM_ROUNDS,
            }
            .into());
        }

        let code = {
            let games = self.games.read().await;
            let mut reserved = self.reserved.write().await;
            let code = pick_game_code(&mut rand::rng(), |code| {
                games.contains_key(code) || reserved.contains(code)
            });
            reserved.insert(code.clone());
            code
        };

        let state = GameState::new(code.clone(), num_rounds);
        let committed = self.store.commit(&GameRecord::from(&state)).await;
        if committed.is_ok() {
            let handle = self.spawn(state);
            self.games.write().await.insert(code.clone(), handle);
        }
        self.reserved.write().await.remove(&code);
        committed?;

        log::info!("Created game {} with {} rounds", code, num_rounds);
        Ok(code)
    }

    /// Handle to a running game. A game whose actor has stopped on its own
    /// is dropped from the manager and reported as not found.
    pub async fn get_game(&self, code: &GameCode) -> InstanceResult<GameHandle> {
        let handle = self.games.read().await.get(code).cloned();
        match handle {
            Some(handle) if !handle.is_closed() => Ok(handle),
            Some(_) => {
                self.remove_stopped().await;
                Err(InstanceError::NotFound(code.clone()))
            }
            None => Err(InstanceError::NotFound(code.clone())),
        }
    }

    /// Add a player, generating their nickname first so the game's actor
    /// never waits on the nickname service.
    pub async fn join(
        &self,
        code: &GameCode,
        name: &str,
        avatar: &str,
        idempotency_key: Option<Uuid>,
    ) -> InstanceResult<IntentOutcome> {
        let handle = self.get_game(code).await?;
        let nickname = match &self.nicknames {
            Some(service) => {
                Some(resolve_nickname(service.as_ref(), name, self.nickname_timeout).await)
            }
            None => None,
        };
        handle
            .submit(
                Intent::Join {
                    name: name.to_string(),
                    avatar: avatar.to_string(),
                    nickname,
                },
                idempotency_key,
            )
            .await
    }

    pub async fn submit(
        &self,
        code: &GameCode,
        intent: Intent,
        idempotency_key: Option<Uuid>,
    ) -> InstanceResult<IntentOutcome> {
        self.get_game(code)
            .await?
            .submit(intent, idempotency_key)
            .await
    }

    pub async fn snapshot(&self, code: &GameCode) -> InstanceResult<Arc<GameUpdate>> {
        self.get_game(code).await?.snapshot().await
    }

    pub async fn subscribe(&self, code: &GameCode) -> InstanceResult<Subscription> {
        self.get_game(code).await?.subscribe().await
    }

    /// Stop a game's actor and remove it from the store. Subscribers see
    /// the game as not found.
    pub async fn delete_game(&self, code: &GameCode) -> InstanceResult<()> {
        let handle = self
            .games
            .write()
            .await
            .remove(code)
            .ok_or_else(|| InstanceError::NotFound(code.clone()))?;

        if let Err(e) = handle.close().await {
            log::debug!("Game {} was already stopped: {}", code, e);
        }
        self.store.delete(code).await?;

        log::info!("Deleted game {}", code);
        Ok(())
    }

    /// Summaries of every live game, ordered by code
    pub async fn list_games(&self) -> Vec<GameSummary> {
        self.remove_stopped().await;
        let handles: Vec<GameHandle> = self.games.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(update) = handle.snapshot().await {
                summaries.push(GameSummary::from(update.as_ref()));
            }
        }
        summaries.sort_by(|a, b| a.code.cmp(&b.code));
        summaries
    }

    pub async fn game_count(&self) -> usize {
        self.games.read().await.len()
    }

    /// Forget games whose actor is gone. Their stored record is kept.
    async fn remove_stopped(&self) {
        self.games.write().await.retain(|code, handle| {
            if handle.is_closed() {
                log::warn!("Game {} stopped unexpectedly", code);
            }
            !handle.is_closed()
        });
    }

    fn spawn(&self, state: GameState) -> GameHandle {
        let (actor, handle) = GameActor::new(state, &self.config, self.store.clone());
        tokio::spawn(actor.run());
        handle
    }
}
