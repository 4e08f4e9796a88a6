//! Game state and its phases.
//!
//! [`GameState`] is the authoritative in-memory record of one game. The
//! phase of the game is explicit in [`Phase`], and each phase only carries
//! the data that's valid while it lasts: the pending secret decisions exist
//! only while deciding, and the turn pointer doesn't exist in the lobby.
//!
//! [`GameRecord`] is the flat view of the same data. It's what gets
//! persisted and what observers receive.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

use super::constants::{DEFAULT_NUM_ROUNDS, MAX_NUM_ROUNDS};
use super::entities::{
    Decision, GameCode, GameEvent, InvalidRoll, Money, Player, PlayerId, RollValue,
};

/// Errors that reject an intent before the game state is touched.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("not your turn")]
    NotYourTurn,
    #[error("not waiting on decisions")]
    DecisionPhaseInactive,
    #[error("already banked this round")]
    AlreadyBanked,
    #[error("need 2+ players")]
    NotEnoughPlayers,
    #[error("game already started")]
    GameAlreadyStarted,
    #[error("player does not exist")]
    PlayerNotFound,
    #[error("only the game creator can do that")]
    NotCreator,
    #[error("name can't be empty")]
    EmptyName,
    #[error("{0}")]
    InvalidRoll(String),
    #[error("rounds must be between 1 and {max}, got {got}")]
    InvalidRoundCount { got: u32, max: u32 },
    #[error("invalid game record: {0}")]
    InvalidRecord(String),
}

impl From<InvalidRoll> for GameError {
    fn from(value: InvalidRoll) -> Self {
        Self::InvalidRoll(value.to_string())
    }
}

pub type GameResult<T> = Result<T, GameError>;

/// Where a game is in its lifecycle.
///
/// The end of a round is a transient step inside
/// [`GameState::end_round`]; it always lands in `Rolling` or `GameOver`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    Lobby,
    Rolling {
        turn: usize,
    },
    /// `turn` is the player who made the roll that opened the phase.
    Deciding {
        turn: usize,
        decisions: HashMap<PlayerId, Decision>,
    },
    GameOver,
}

impl Phase {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::Rolling { .. } => "rolling",
            Self::Deciding { .. } => "deciding",
            Self::GameOver => "game_over",
        }
    }
}

/// Per-round transients. Reset at the start of every round.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RoundState {
    pub bank: Money,
    pub total_rolls: u32,
    pub broke: bool,
}

#[derive(Clone, Debug)]
pub struct GameState {
    code: GameCode,
    pub(crate) players: Vec<Player>,
    pub(crate) phase: Phase,
    pub(crate) round: RoundState,
    pub(crate) rounds_left: u32,
    pub(crate) num_rounds: u32,
    pub(crate) creator_id: Option<PlayerId>,
    pub(crate) last_roll: Option<RollValue>,
    pub(crate) events: VecDeque<GameEvent>,
}

impl GameState {
    /// An empty game waiting in the lobby. A round count of zero falls
    /// back to the default.
    #[must_use]
    pub fn new(code: GameCode, num_rounds: u32) -> Self {
        let num_rounds = if num_rounds == 0 {
            DEFAULT_NUM_ROUNDS
        } else {
            num_rounds.min(MAX_NUM_ROUNDS)
        };
        Self {
            code,
            players: Vec::new(),
            phase: Phase::Lobby,
            round: RoundState::default(),
            rounds_left: num_rounds,
            num_rounds,
            creator_id: None,
            last_roll: None,
            events: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn code(&self) -> &GameCode {
        &self.code
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub fn bank(&self) -> Money {
        self.round.bank
    }

    #[must_use]
    pub fn total_rolls(&self) -> u32 {
        self.round.total_rolls
    }

    #[must_use]
    pub fn round_broke(&self) -> bool {
        self.round.broke
    }

    #[must_use]
    pub fn rounds_left(&self) -> u32 {
        self.rounds_left
    }

    #[must_use]
    pub fn num_rounds(&self) -> u32 {
        self.num_rounds
    }

    #[must_use]
    pub fn creator_id(&self) -> Option<PlayerId> {
        self.creator_id
    }

    #[must_use]
    pub fn last_roll(&self) -> Option<RollValue> {
        self.last_roll
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        !matches!(self.phase, Phase::Lobby)
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver)
    }

    #[must_use]
    pub fn is_waiting_for_decisions(&self) -> bool {
        matches!(self.phase, Phase::Deciding { .. })
    }

    /// Index of the player whose turn it is, or 0 outside of play.
    #[must_use]
    pub fn current_player_index(&self) -> usize {
        match self.phase {
            Phase::Rolling { turn } | Phase::Deciding { turn, .. } => turn,
            Phase::Lobby | Phase::GameOver => 0,
        }
    }

    /// The player allowed to roll next. `None` outside of `Rolling`.
    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        match self.phase {
            Phase::Rolling { turn } => self.players.get(turn),
            _ => None,
        }
    }

    #[must_use]
    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == player_id)
    }

    #[must_use]
    pub fn player_index(&self, player_id: PlayerId) -> Option<usize> {
        self.players.iter().position(|player| player.id == player_id)
    }

    /// Players who haven't banked this round.
    #[must_use]
    pub fn active_player_count(&self) -> usize {
        self.players.iter().filter(|player| !player.has_banked).count()
    }

    /// Secret decisions recorded so far. `None` outside the decision phase.
    #[must_use]
    pub fn pending_decisions(&self) -> Option<&HashMap<PlayerId, Decision>> {
        match &self.phase {
            Phase::Deciding { decisions, .. } => Some(decisions),
            _ => None,
        }
    }

    pub fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push_back(event);
    }

    pub(crate) fn require_creator(&self, requester: PlayerId) -> GameResult<()> {
        match self.creator_id {
            Some(creator) if creator == requester => Ok(()),
            Some(_) => Err(GameError::NotCreator),
            None => Err(GameError::PlayerNotFound),
        }
    }
}

/// Flat, serializable form of a [`GameState`].
///
/// One record per game, overwritten whole on every committed transition.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub code: GameCode,
    pub players: Vec<Player>,
    pub current_player_index: usize,
    pub bank: Money,
    pub total_rolls: u32,
    pub rounds_left: u32,
    pub num_rounds: u32,
    pub round_broke: bool,
    pub waiting_for_decisions: bool,
    #[serde(default)]
    pub secret_decisions: HashMap<PlayerId, Decision>,
    pub game_started: bool,
    pub game_over: bool,
    pub creator_id: Option<PlayerId>,
    pub last_roll: Option<RollValue>,
}

impl From<&GameState> for GameRecord {
    fn from(state: &GameState) -> Self {
        Self {
            code: state.code.clone(),
            players: state.players.clone(),
            current_player_index: state.current_player_index(),
            bank: state.round.bank,
            total_rolls: state.round.total_rolls,
            rounds_left: state.rounds_left,
            num_rounds: state.num_rounds,
            round_broke: state.round.broke,
            waiting_for_decisions: state.is_waiting_for_decisions(),
            secret_decisions: state.pending_decisions().cloned().unwrap_or_default(),
            game_started: state.is_started(),
            game_over: state.is_over(),
            creator_id: state.creator_id,
            last_roll: state.last_roll,
        }
    }
}

impl TryFrom<GameRecord> for GameState {
    type Error = GameError;

    fn try_from(record: GameRecord) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| GameError::InvalidRecord(reason.to_string());

        if record.game_over && !record.game_started {
            return Err(invalid("game over before it started"));
        }
        if record.game_started
            && !record.game_over
            && record.current_player_index >= record.players.len()
        {
            return Err(invalid("current player index out of range"));
        }
        if !record.waiting_for_decisions && !record.secret_decisions.is_empty() {
            return Err(invalid("decisions recorded outside the decision phase"));
        }
        let all_active = record.secret_decisions.keys().all(|id| {
            record
                .players
                .iter()
                .any(|player| player.id == *id && !player.has_banked)
        });
        if !all_active {
            return Err(invalid("decision from a missing or banked player"));
        }
        if let Some(creator) = record.creator_id
            && !record.players.iter().any(|player| player.id == creator)
        {
            return Err(invalid("creator is not a player"));
        }

        let turn = record.current_player_index;
        let phase = if !record.game_started {
            Phase::Lobby
        } else if record.game_over {
            Phase::GameOver
        } else if record.waiting_for_decisions {
            Phase::Deciding {
                turn,
                decisions: record.secret_decisions,
            }
        } else {
            Phase::Rolling { turn }
        };

        let mut state = Self {
            code: record.code,
            players: record.players,
            phase,
            round: RoundState {
                bank: record.bank,
                total_rolls: record.total_rolls,
                broke: record.round_broke,
            },
            rounds_left: record.rounds_left,
            num_rounds: if record.num_rounds == 0 {
                DEFAULT_NUM_ROUNDS
            } else {
                record.num_rounds
            },
            creator_id: record.creator_id,
            last_roll: record.last_roll,
            events: VecDeque::new(),
        };
        // A record saved with every decision in closes the phase on load.
        if state.all_decisions_in() {
            state.resolve_decisions();
        }
        Ok(state)
    }
}
