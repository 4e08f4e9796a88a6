//! Game actor message types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot};
use uuid::Uuid;

use super::errors::InstanceResult;
use crate::game::{
    Decision, GameEvent, GameRecord, GameResult, GameResults, GameState, PlayerId, RollValue,
};

/// A player's request to change a game.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Intent {
    Join {
        name: String,
        #[serde(default)]
        avatar: String,
        /// Already-generated alias. Falls back to `name` when absent.
        #[serde(default)]
        nickname: Option<String>,
    },
    Start {
        player_id: PlayerId,
    },
    Roll {
        player_id: PlayerId,
        value: RollValue,
    },
    Decide {
        player_id: PlayerId,
        decision: Decision,
    },
    Exit {
        player_id: PlayerId,
    },
    Reset {
        player_id: PlayerId,
    },
    ConfigureRounds {
        player_id: PlayerId,
        num_rounds: u32,
    },
}

impl Intent {
    /// Apply the intent to `state`, returning the acting player. On error
    /// `state` is unchanged.
    pub fn apply(self, state: &mut GameState) -> GameResult<PlayerId> {
        match self {
            Intent::Join {
                name,
                avatar,
                nickname,
            } => state.join(&name, &avatar, nickname.as_deref()),
            Intent::Start { player_id } => state.start_game(player_id).map(|()| player_id),
            Intent::Roll { player_id, value } => {
                state.apply_roll(player_id, value).map(|()| player_id)
            }
            Intent::Decide {
                player_id,
                decision,
            } => state.submit_decision(player_id, decision).map(|()| player_id),
            Intent::Exit { player_id } => state.exit(player_id).map(|()| player_id),
            Intent::Reset { player_id } => state.reset_game(player_id).map(|()| player_id),
            Intent::ConfigureRounds {
                player_id,
                num_rounds,
            } => state
                .configure_rounds(player_id, num_rounds)
                .map(|()| player_id),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Intent::Join { .. } => "join",
            Intent::Start { .. } => "start",
            Intent::Roll { .. } => "roll",
            Intent::Decide { .. } => "decide",
            Intent::Exit { .. } => "exit",
            Intent::Reset { .. } => "reset",
            Intent::ConfigureRounds { .. } => "configure_rounds",
        }
    }
}

/// A committed snapshot of a game as observers see it.
///
/// Secret decisions are never included; `decided` lists who has chosen
/// so far without revealing what they chose.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameUpdate {
    /// Increases by one with every committed transition of this game.
    pub version: u64,
    pub state: GameRecord,
    pub decided: Vec<PlayerId>,
    pub results: Option<GameResults>,
    /// What happened in the transition that produced this snapshot.
    pub events: Vec<GameEvent>,
}

impl GameUpdate {
    pub fn new(version: u64, state: &GameState, events: Vec<GameEvent>) -> Self {
        let mut record = GameRecord::from(state);
        let secret = std::mem::take(&mut record.secret_decisions);
        let decided = record
            .players
            .iter()
            .map(|player| player.id)
            .filter(|id| secret.contains_key(id))
            .collect();
        Self {
            version,
            state: record,
            decided,
            results: state.results(),
            events,
        }
    }
}

/// Reply to an accepted intent.
#[derive(Clone, Debug)]
pub struct IntentOutcome {
    pub player_id: PlayerId,
    pub update: Arc<GameUpdate>,
}

/// Messages that can be sent to a [`GameActor`](super::GameActor)
#[derive(Debug)]
pub enum GameMessage {
    /// Apply an intent. A repeated `idempotency_key` replays the earlier
    /// outcome instead of applying the intent again.
    Intent {
        idempotency_key: Option<Uuid>,
        intent: Intent,
        response: oneshot::Sender<InstanceResult<IntentOutcome>>,
    },

    /// Get the last committed snapshot
    GetSnapshot {
        response: oneshot::Sender<Arc<GameUpdate>>,
    },

    /// Start receiving updates. The reply carries the current snapshot and
    /// a receiver for everything committed after it.
    Subscribe {
        response: oneshot::Sender<(Arc<GameUpdate>, broadcast::Receiver<Arc<GameUpdate>>)>,
    },

    /// Stop the actor. Subscribers see the game as not found.
    Close { response: oneshot::Sender<()> },
}
