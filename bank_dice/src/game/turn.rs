//! Applying rolls to the bank.

use log::debug;

use super::constants::{EARLY_SEVEN_BONUS, PIP_VALUE, SAFE_ROLLS};
use super::entities::{GameEvent, Money, PlayerId, RollValue};
use super::state_machine::{GameError, GameResult, GameState, Phase};

impl GameState {
    /// Apply a roll reported by the player whose turn it is.
    ///
    /// Within the first three rolls of a round a seven pays a flat bonus.
    /// After that a seven breaks the round and the bank is forfeited.
    /// Every roll from the third on opens the decision phase.
    ///
    /// # Errors
    ///
    /// [`GameError::NotYourTurn`] if `player_id` doesn't hold the turn,
    /// including while decisions are pending, in the lobby, and after
    /// the game is over.
    pub fn apply_roll(&mut self, player_id: PlayerId, value: RollValue) -> GameResult<()> {
        let Phase::Rolling { turn } = self.phase else {
            return Err(GameError::NotYourTurn);
        };
        let player = self
            .players
            .get_mut(turn)
            .filter(|player| player.id == player_id)
            .ok_or(GameError::NotYourTurn)?;

        self.round.total_rolls += 1;
        self.last_roll = Some(value);

        match value {
            RollValue::Sum(7) if self.round.total_rolls > SAFE_ROLLS => {
                self.round.broke = true;
                player.break7s += 1;
            }
            RollValue::Sum(7) => {
                self.round.bank = self.round.bank.saturating_add(EARLY_SEVEN_BONUS);
                player.normal_rolls += 1;
            }
            RollValue::Double => {
                self.round.bank = self.round.bank.saturating_mul(2);
                player.doubles += 1;
            }
            RollValue::Sum(pips) => {
                self.round.bank = self
                    .round
                    .bank
                    .saturating_add(Money::from(pips) * PIP_VALUE);
                player.normal_rolls += 1;
            }
        }

        let name = player.nickname.clone();
        debug!(
            "{}: {name} rolled {value}, bank ${} after {} rolls",
            self.code(),
            self.round.bank,
            self.round.total_rolls
        );
        self.push_event(GameEvent::Rolled {
            name: name.clone(),
            value,
        });

        if self.round.broke {
            self.push_event(GameEvent::RoundBroken {
                name,
                forfeited: self.round.bank,
            });
            self.end_round();
        } else if self.round.total_rolls >= SAFE_ROLLS {
            self.enter_decision_phase();
        } else {
            self.move_to_next_player();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Decision, GameCode};

    fn started_game(players: usize, rounds: u32) -> (GameState, Vec<PlayerId>) {
        let mut state = GameState::new(GameCode::new("PIZZA"), rounds);
        let ids: Vec<PlayerId> = (0..players)
            .map(|i| state.join(&format!("p{i}"), "🎲", None).unwrap())
            .collect();
        state.start_game(ids[0]).unwrap();
        (state, ids)
    }

    #[test]
    fn test_sum_adds_pips_to_bank() {
        let (mut state, ids) = started_game(2, 3);
        state.apply_roll(ids[0], RollValue::Sum(5)).unwrap();
        assert_eq!(state.bank(), 5_000);
        assert_eq!(state.total_rolls(), 1);
        assert_eq!(state.players()[0].normal_rolls, 1);
        assert_eq!(state.current_player_index(), 1);
        assert_eq!(state.last_roll(), Some(RollValue::Sum(5)));
    }

    #[test]
    fn test_early_seven_pays_bonus() {
        let (mut state, ids) = started_game(2, 3);
        state.apply_roll(ids[0], RollValue::SEVEN).unwrap();
        assert_eq!(state.bank(), 70_000);
        assert!(!state.round_broke());
        assert_eq!(state.players()[0].normal_rolls, 1);
        assert_eq!(state.players()[0].break7s, 0);
    }

    #[test]
    fn test_double_doubles_bank() {
        let (mut state, ids) = started_game(2, 3);
        state.round.bank = 5_000;
        state.apply_roll(ids[0], RollValue::Double).unwrap();
        assert_eq!(state.bank(), 10_000);
        assert_eq!(state.players()[0].doubles, 1);
        assert_eq!(state.players()[0].normal_rolls, 0);
    }

    #[test]
    fn test_bank_and_score_saturate_after_long_run_of_doubles() {
        let (mut state, ids) = started_game(2, 3);
        for value in [5, 5, 5] {
            let current = state.current_player().unwrap().id;
            state.apply_roll(current, RollValue::Sum(value)).unwrap();
        }
        for _ in 0..70 {
            for id in &ids {
                state.submit_decision(*id, Decision::Continue).unwrap();
            }
            let current = state.current_player().unwrap().id;
            state.apply_roll(current, RollValue::Double).unwrap();
        }
        assert_eq!(state.bank(), Money::MAX);

        for id in &ids {
            state.submit_decision(*id, Decision::Continue).unwrap();
        }
        let current = state.current_player().unwrap().id;
        state.apply_roll(current, RollValue::Sum(5)).unwrap();
        assert_eq!(state.bank(), Money::MAX);

        state.players[0].score = 1_000;
        for id in &ids {
            state.submit_decision(*id, Decision::Bank).unwrap();
        }
        assert_eq!(state.players()[0].score, Money::MAX);
        assert_eq!(state.players()[1].score, Money::MAX);
        assert_eq!(state.rounds_left(), 2);
        assert_eq!(state.bank(), 0);
    }

    #[test]
    fn test_third_roll_opens_decisions() {
        let (mut state, ids) = started_game(2, 3);
        state.apply_roll(ids[0], RollValue::Sum(5)).unwrap();
        state.apply_roll(ids[1], RollValue::Sum(5)).unwrap();
        state.apply_roll(ids[0], RollValue::Sum(6)).unwrap();
        assert!(state.is_waiting_for_decisions());
        assert_eq!(state.bank(), 16_000);

        let err = state.apply_roll(ids[1], RollValue::Sum(4)).unwrap_err();
        assert_eq!(err, GameError::NotYourTurn);
        let err = state.apply_roll(ids[0], RollValue::Sum(4)).unwrap_err();
        assert_eq!(err, GameError::NotYourTurn);
        assert_eq!(state.total_rolls(), 3);
    }

    #[test]
    fn test_late_seven_breaks_round() {
        let (mut state, ids) = started_game(2, 3);
        state.apply_roll(ids[0], RollValue::Sum(4)).unwrap();
        state.apply_roll(ids[1], RollValue::Sum(4)).unwrap();
        state.apply_roll(ids[0], RollValue::Sum(4)).unwrap();
        state.submit_decision(ids[0], Decision::Continue).unwrap();
        state.submit_decision(ids[1], Decision::Continue).unwrap();
        assert_eq!(state.current_player_index(), 1);
        assert_eq!(state.bank(), 12_000);

        state.apply_roll(ids[1], RollValue::SEVEN).unwrap();

        assert_eq!(state.players()[1].break7s, 1);
        assert_eq!(state.bank(), 0);
        assert_eq!(state.total_rolls(), 0);
        assert_eq!(state.rounds_left(), 2);
        assert!(!state.round_broke());
        assert_eq!(state.players()[0].score, 0);
        assert_eq!(state.players()[1].score, 0);
        assert_eq!(state.current_player_index(), 0);
    }

    #[test]
    fn test_wrong_player_is_rejected_without_mutation() {
        let (mut state, ids) = started_game(2, 3);
        let err = state.apply_roll(ids[1], RollValue::Sum(9)).unwrap_err();
        assert_eq!(err, GameError::NotYourTurn);
        assert_eq!(state.bank(), 0);
        assert_eq!(state.total_rolls(), 0);
        assert!(state.last_roll().is_none());
    }

    #[test]
    fn test_roll_rejected_in_lobby_and_after_game_over() {
        let mut state = GameState::new(GameCode::new("PIZZA"), 1);
        let p1 = state.join("Ada", "🦊", None).unwrap();
        assert_eq!(
            state.apply_roll(p1, RollValue::Sum(6)),
            Err(GameError::NotYourTurn)
        );

        let (mut state, ids) = started_game(2, 1);
        state.end_round();
        assert!(state.is_over());
        assert_eq!(
            state.apply_roll(ids[0], RollValue::Sum(6)),
            Err(GameError::NotYourTurn)
        );
    }

    #[test]
    fn test_roll_events() {
        let (mut state, ids) = started_game(2, 3);
        state.drain_events();
        state.apply_roll(ids[0], RollValue::Sum(8)).unwrap();
        let events: Vec<GameEvent> = state.drain_events().into();
        assert_eq!(
            events,
            vec![GameEvent::Rolled {
                name: "p0".to_string(),
                value: RollValue::Sum(8)
            }]
        );
    }
}
