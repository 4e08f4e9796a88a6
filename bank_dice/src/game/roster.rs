//! Joining and leaving a game.

use log::info;

use super::entities::{GameEvent, Player, PlayerId};
use super::state_machine::{GameError, GameResult, GameState, Phase, RoundState};

impl GameState {
    /// Add a player to the lobby. The first player to join becomes the
    /// game's creator.
    ///
    /// # Errors
    ///
    /// - [`GameError::GameAlreadyStarted`] once play has begun.
    /// - [`GameError::EmptyName`] if `name` is blank.
    pub fn join(&mut self, name: &str, avatar: &str, nickname: Option<&str>) -> GameResult<PlayerId> {
        if self.is_started() {
            return Err(GameError::GameAlreadyStarted);
        }
        if name.trim().is_empty() {
            return Err(GameError::EmptyName);
        }

        let player = Player::new(name, avatar, nickname);
        let id = player.id;
        info!("{}: {} joined as {}", self.code(), player.name, player.nickname);
        self.push_event(GameEvent::Joined {
            name: player.nickname.clone(),
        });
        self.players.push(player);
        if self.creator_id.is_none() {
            self.creator_id = Some(id);
        }
        Ok(id)
    }

    /// Remove a player at any point in the game.
    ///
    /// The turn pointer keeps pointing at the same player when someone
    /// before them leaves. When the player on turn leaves, the turn passes
    /// to the next player who hasn't banked. A pending decision from the
    /// leaving player is dropped, and the decision phase resolves if
    /// everyone left has chosen. Creator rights pass to the first
    /// remaining player.
    ///
    /// # Errors
    ///
    /// [`GameError::PlayerNotFound`] for an unknown player.
    pub fn exit(&mut self, player_id: PlayerId) -> GameResult<()> {
        let idx = self
            .player_index(player_id)
            .ok_or(GameError::PlayerNotFound)?;
        let player = self.players.remove(idx);
        info!("{}: {} left", self.code(), player.nickname);
        self.push_event(GameEvent::Left {
            name: player.nickname,
        });

        if self.creator_id == Some(player_id) {
            self.creator_id = self.players.first().map(|player| player.id);
        }

        let num_players = self.players.len();
        if num_players == 0 {
            self.phase = Phase::Lobby;
            self.round = RoundState::default();
            self.rounds_left = self.num_rounds;
            self.last_roll = None;
            return Ok(());
        }

        let repair = |turn: usize| {
            if idx < turn {
                (turn - 1, false)
            } else if idx == turn {
                ((idx + num_players - 1) % num_players, true)
            } else {
                (turn, false)
            }
        };

        match &mut self.phase {
            Phase::Rolling { turn } => {
                let (repaired, was_on_turn) = repair(*turn);
                *turn = repaired;
                if was_on_turn {
                    self.move_to_next_player();
                }
            }
            Phase::Deciding { turn, decisions } => {
                decisions.remove(&player_id);
                *turn = repair(*turn).0;
                if self.all_decisions_in() {
                    self.resolve_decisions();
                }
            }
            Phase::Lobby | Phase::GameOver => {}
        }
        Ok(())
    }
}
