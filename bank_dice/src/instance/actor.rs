//! Game actor implementation with async message handling.
//!
//! One actor owns each game. Intents are drained from its inbox one at a
//! time, so two players can never both act on the same snapshot.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use uuid::Uuid;

use super::{
    config::GameConfig,
    errors::{InstanceError, InstanceResult},
    messages::{GameMessage, GameUpdate, Intent, IntentOutcome},
    subscription::Subscription,
};
use crate::db::GameStore;
use crate::game::{GameCode, GameRecord, GameState};

/// Game actor handle for sending messages
#[derive(Clone, Debug)]
pub struct GameHandle {
    sender: mpsc::Sender<GameMessage>,
    code: GameCode,
}

impl GameHandle {
    pub fn new(sender: mpsc::Sender<GameMessage>, code: GameCode) -> Self {
        Self { sender, code }
    }

    pub fn code(&self) -> &GameCode {
        &self.code
    }

    /// Whether the actor has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the game
    pub async fn send(&self, message: GameMessage) -> InstanceResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| self.not_found())
    }

    /// Apply an intent and wait for it to be committed
    pub async fn submit(
        &self,
        intent: Intent,
        idempotency_key: Option<Uuid>,
    ) -> InstanceResult<IntentOutcome> {
        let (tx, rx) = oneshot::channel();
        self.send(GameMessage::Intent {
            idempotency_key,
            intent,
            response: tx,
        })
        .await?;
        rx.await.map_err(|_| self.not_found())?
    }

    /// Last committed snapshot
    pub async fn snapshot(&self) -> InstanceResult<Arc<GameUpdate>> {
        let (tx, rx) = oneshot::channel();
        self.send(GameMessage::GetSnapshot { response: tx }).await?;
        rx.await.map_err(|_| self.not_found())
    }

    /// Follow every committed snapshot, starting with the current one
    pub async fn subscribe(&self) -> InstanceResult<Subscription> {
        let (tx, rx) = oneshot::channel();
        self.send(GameMessage::Subscribe { response: tx }).await?;
        let (current, receiver) = rx.await.map_err(|_| self.not_found())?;
        Ok(Subscription::new(self.clone(), current, receiver))
    }

    /// Stop the actor once it has finished the messages ahead of this one
    pub async fn close(&self) -> InstanceResult<()> {
        let (tx, rx) = oneshot::channel();
        self.send(GameMessage::Close { response: tx }).await?;
        rx.await.map_err(|_| self.not_found())
    }

    fn not_found(&self) -> InstanceError {
        InstanceError::NotFound(self.code.clone())
    }
}

/// Successful outcomes of recently seen idempotency keys, oldest evicted
/// first.
struct RecentOutcomes {
    capacity: usize,
    order: VecDeque<Uuid>,
    outcomes: HashMap<Uuid, IntentOutcome>,
}

impl RecentOutcomes {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            outcomes: HashMap::with_capacity(capacity),
        }
    }

    fn get(&self, key: &Uuid) -> Option<&IntentOutcome> {
        self.outcomes.get(key)
    }

    fn insert(&mut self, key: Uuid, outcome: IntentOutcome) {
        if self.capacity == 0 {
            return;
        }
        if self.outcomes.insert(key, outcome).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.outcomes.remove(&oldest);
            }
        }
    }
}

/// Actor owning a single game
pub struct GameActor {
    code: GameCode,

    /// Last committed state
    state: GameState,

    /// Snapshot of `state` as last published
    current: Arc<GameUpdate>,

    inbox: mpsc::Receiver<GameMessage>,

    store: Arc<dyn GameStore>,

    /// Fan-out to subscribers. Slow receivers lose the oldest updates.
    updates: broadcast::Sender<Arc<GameUpdate>>,

    recent: RecentOutcomes,

    is_closed: bool,
}

impl GameActor {
    /// Create an actor for a game whose state is already committed
    pub fn new(
        state: GameState,
        config: &GameConfig,
        store: Arc<dyn GameStore>,
    ) -> (Self, GameHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity.max(1));
        let (updates, _) = broadcast::channel(config.subscriber_buffer.max(1));
        let code = state.code().clone();
        let current = Arc::new(GameUpdate::new(0, &state, Vec::new()));

        let actor = Self {
            code: code.clone(),
            state,
            current,
            inbox,
            store,
            updates,
            recent: RecentOutcomes::new(config.idempotency_window),
            is_closed: false,
        };

        (actor, GameHandle::new(sender, code))
    }

    /// Run the game actor event loop
    pub async fn run(mut self) {
        log::info!(
            "Game {} starting with {} players",
            self.code,
            self.state.players().len()
        );

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message).await;

            if self.is_closed {
                break;
            }
        }

        log::info!("Game {} closed", self.code);
    }

    async fn handle_message(&mut self, message: GameMessage) {
        match message {
            GameMessage::Intent {
                idempotency_key,
                intent,
                response,
            } => {
                let result = self.handle_intent(idempotency_key, intent).await;
                let _ = response.send(result);
            }

            GameMessage::GetSnapshot { response } => {
                let _ = response.send(self.current.clone());
            }

            GameMessage::Subscribe { response } => {
                let receiver = self.updates.subscribe();
                log::debug!(
                    "Game {}: subscriber joined ({} total)",
                    self.code,
                    self.updates.receiver_count()
                );
                let _ = response.send((self.current.clone(), receiver));
            }

            GameMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(());
            }
        }
    }

    /// Apply an intent to a copy of the state, commit the copy, and only
    /// then make it current and publish it.
    async fn handle_intent(
        &mut self,
        idempotency_key: Option<Uuid>,
        intent: Intent,
    ) -> InstanceResult<IntentOutcome> {
        if let Some(key) = idempotency_key
            && let Some(outcome) = self.recent.get(&key)
        {
            log::debug!("Game {}: replaying outcome for key {}", self.code, key);
            return Ok(outcome.clone());
        }

        let name = intent.name();
        let mut next = self.state.clone();
        let player_id = intent.apply(&mut next)?;

        if let Err(e) = self.store.commit(&GameRecord::from(&next)).await {
            log::error!("Game {}: failed to commit {}: {}", self.code, name, e);
            return Err(InstanceError::Commit(e));
        }

        let events = next.drain_events().into();
        self.state = next;
        let update = self.publish(events);
        let outcome = IntentOutcome { player_id, update };

        if let Some(key) = idempotency_key {
            self.recent.insert(key, outcome.clone());
        }
        Ok(outcome)
    }

    fn publish(&mut self, events: Vec<crate::game::GameEvent>) -> Arc<GameUpdate> {
        let update = Arc::new(GameUpdate::new(
            self.current.version + 1,
            &self.state,
            events,
        ));
        self.current = update.clone();
        // An error only means nobody is subscribed right now.
        let _ = self.updates.send(update.clone());
        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryGameStore;
    use crate::game::PlayerId;

    fn spawn_game() -> (GameHandle, Arc<MemoryGameStore>) {
        let store = Arc::new(MemoryGameStore::new());
        let state = GameState::new(GameCode::new("BONK"), 3);
        let (actor, handle) = GameActor::new(state, &GameConfig::default(), store.clone());
        tokio::spawn(actor.run());
        (handle, store)
    }

    fn join(name: &str) -> Intent {
        Intent::Join {
            name: name.to_string(),
            avatar: "🎲".to_string(),
            nickname: None,
        }
    }

    #[tokio::test]
    async fn test_intent_is_committed_before_reply() {
        let (handle, store) = spawn_game();

        let outcome = handle.submit(join("Ada"), None).await.unwrap();

        assert_eq!(outcome.update.version, 1);
        let stored = store.load(handle.code()).await.unwrap().unwrap();
        assert_eq!(stored.players.len(), 1);
        assert_eq!(stored.players[0].id, outcome.player_id);
    }

    #[tokio::test]
    async fn test_rejected_intent_is_not_committed() {
        let (handle, store) = spawn_game();
        let ada = handle.submit(join("Ada"), None).await.unwrap().player_id;

        let err = handle
            .submit(Intent::Start { player_id: ada }, None)
            .await
            .unwrap_err();

        assert!(matches!(err, InstanceError::Game(_)));
        assert_eq!(handle.snapshot().await.unwrap().version, 1);
        let stored = store.load(handle.code()).await.unwrap().unwrap();
        assert!(!stored.game_started);
    }

    #[tokio::test]
    async fn test_idempotency_key_replays_outcome() {
        let (handle, _) = spawn_game();
        let key = Uuid::new_v4();

        let first = handle.submit(join("Ada"), Some(key)).await.unwrap();
        let second = handle.submit(join("Ada"), Some(key)).await.unwrap();

        assert_eq!(first.player_id, second.player_id);
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state.players.len(), 1);
        assert_eq!(snapshot.version, 1);
    }

    #[tokio::test]
    async fn test_close_stops_actor() {
        let (handle, _) = spawn_game();
        handle.close().await.unwrap();

        let err = handle.snapshot().await.unwrap_err();
        assert!(matches!(err, InstanceError::NotFound(_)));
        assert!(handle.is_closed());
    }

    #[test]
    fn test_recent_outcomes_evicts_oldest() {
        let update = Arc::new(GameUpdate::new(
            0,
            &GameState::new(GameCode::new("BONK"), 3),
            Vec::new(),
        ));
        let outcome = IntentOutcome {
            player_id: PlayerId::new(),
            update,
        };
        let mut recent = RecentOutcomes::new(2);
        let keys: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for key in &keys {
            recent.insert(*key, outcome.clone());
        }

        assert!(recent.get(&keys[0]).is_none());
        assert!(recent.get(&keys[1]).is_some());
        assert!(recent.get(&keys[2]).is_some());
    }
}
