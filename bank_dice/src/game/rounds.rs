//! Turn order, round rollover, and the game lifecycle.

use log::info;

use super::constants::{MAX_NUM_ROUNDS, MIN_PLAYERS};
use super::entities::{GameEvent, PlayerId};
use super::state_machine::{GameError, GameResult, GameState, Phase, RoundState};

impl GameState {
    /// Pass the turn to the next player who hasn't banked, scanning
    /// forward from the current player and wrapping around. The current
    /// player is the last candidate. Ends the round if nobody is left.
    pub fn move_to_next_player(&mut self) {
        if !matches!(self.phase, Phase::Rolling { .. } | Phase::Deciding { .. }) {
            return;
        }
        let num_players = self.players.len();
        let current = self.current_player_index();
        let next = (1..=num_players)
            .map(|step| (current + step) % num_players)
            .find(|&idx| !self.players[idx].has_banked);

        match next {
            Some(turn) => self.phase = Phase::Rolling { turn },
            None => self.end_round(),
        }
    }

    /// Close out the current round. The bank is cleared whether it was
    /// claimed or forfeited, and the first player opens the next round.
    /// Ending the last round ends the game.
    pub fn end_round(&mut self) {
        if !matches!(self.phase, Phase::Rolling { .. } | Phase::Deciding { .. }) {
            return;
        }
        for player in &mut self.players {
            player.has_banked = false;
        }
        let was_last_round = self.rounds_left <= 1;
        self.rounds_left = self.rounds_left.saturating_sub(1);
        self.round = RoundState::default();
        self.push_event(GameEvent::RoundEnded {
            rounds_left: self.rounds_left,
        });

        if was_last_round {
            self.phase = Phase::GameOver;
            let winner = self.winner().map(|player| player.nickname.clone());
            info!(
                "{}: game over, winner {}",
                self.code(),
                winner.as_deref().unwrap_or("nobody")
            );
            self.push_event(GameEvent::GameOver { winner });
        } else {
            self.phase = Phase::Rolling { turn: 0 };
            info!("{}: round over, {} left", self.code(), self.rounds_left);
        }
    }

    /// Leave the lobby and start the first round.
    ///
    /// # Errors
    ///
    /// - [`GameError::GameAlreadyStarted`] outside the lobby.
    /// - [`GameError::NotCreator`] unless `requester` created the game.
    /// - [`GameError::NotEnoughPlayers`] with fewer than two players.
    pub fn start_game(&mut self, requester: PlayerId) -> GameResult<()> {
        if self.is_started() {
            return Err(GameError::GameAlreadyStarted);
        }
        self.require_creator(requester)?;
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }

        self.phase = Phase::Rolling { turn: 0 };
        self.rounds_left = self.num_rounds;
        self.round = RoundState::default();
        self.last_roll = None;
        info!(
            "{}: started with {} players, {} rounds",
            self.code(),
            self.players.len(),
            self.num_rounds
        );
        self.push_event(GameEvent::GameStarted);
        Ok(())
    }

    /// Return to the lobby with everyone's score and counters zeroed.
    /// The roster and the configured number of rounds are kept.
    ///
    /// # Errors
    ///
    /// [`GameError::NotCreator`] unless `requester` created the game.
    pub fn reset_game(&mut self, requester: PlayerId) -> GameResult<()> {
        self.require_creator(requester)?;

        for player in &mut self.players {
            player.reset_counters();
        }
        self.phase = Phase::Lobby;
        self.rounds_left = self.num_rounds;
        self.round = RoundState::default();
        self.last_roll = None;
        info!("{}: reset", self.code());
        self.push_event(GameEvent::GameReset);
        Ok(())
    }

    /// Change the number of rounds while still in the lobby.
    ///
    /// # Errors
    ///
    /// - [`GameError::GameAlreadyStarted`] outside the lobby.
    /// - [`GameError::NotCreator`] unless `requester` created the game.
    /// - [`GameError::InvalidRoundCount`] outside `1..=MAX_NUM_ROUNDS`.
    pub fn configure_rounds(&mut self, requester: PlayerId, num_rounds: u32) -> GameResult<()> {
        if self.is_started() {
            return Err(GameError::GameAlreadyStarted);
        }
        self.require_creator(requester)?;
        if !(1..=MAX_NUM_ROUNDS).contains(&num_rounds) {
            return Err(GameError::InvalidRoundCount {
                got: num_rounds,
                max: MAX_NUM_ROUNDS,
            });
        }
        self.num_rounds = num_rounds;
        self.rounds_left = num_rounds;
        self.push_event(GameEvent::RoundsConfigured { num_rounds });
        Ok(())
    }
}
