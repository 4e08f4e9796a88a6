//! The simultaneous bank-or-continue decision phase.
//!
//! Once a round has seen its safe rolls, every player who still has money
//! riding secretly chooses to bank or continue after each roll. Choices can
//! be changed until the last active player has chosen; at that point the
//! phase resolves on its own.

use log::{debug, info};
use std::collections::HashMap;

use super::entities::{Decision, GameEvent, PlayerId};
use super::state_machine::{GameError, GameResult, GameState, Phase};

impl GameState {
    /// Open the decision phase with no choices recorded. The turn stays
    /// with the player who made the roll.
    pub fn enter_decision_phase(&mut self) {
        let turn = self.current_player_index();
        self.phase = Phase::Deciding {
            turn,
            decisions: HashMap::new(),
        };
        debug!("{}: waiting on decisions, bank ${}", self.code(), self.bank());
        self.push_event(GameEvent::DecisionPhaseOpened);
    }

    /// Record or replace a player's secret choice, resolving the phase
    /// when every active player has chosen.
    ///
    /// # Errors
    ///
    /// - [`GameError::DecisionPhaseInactive`] outside the decision phase.
    /// - [`GameError::PlayerNotFound`] for an unknown player.
    /// - [`GameError::AlreadyBanked`] if the player banked earlier this round.
    pub fn submit_decision(&mut self, player_id: PlayerId, decision: Decision) -> GameResult<()> {
        let Phase::Deciding { decisions, .. } = &mut self.phase else {
            return Err(GameError::DecisionPhaseInactive);
        };
        let player = self
            .players
            .iter()
            .find(|player| player.id == player_id)
            .ok_or(GameError::PlayerNotFound)?;
        if player.has_banked {
            return Err(GameError::AlreadyBanked);
        }
        decisions.insert(player_id, decision);

        if self.all_decisions_in() {
            self.resolve_decisions();
        }
        Ok(())
    }

    /// Whether every active player has a recorded decision.
    #[must_use]
    pub fn all_decisions_in(&self) -> bool {
        self.pending_decisions()
            .is_some_and(|decisions| decisions.len() >= self.active_player_count())
    }

    /// Pay out everyone who chose to bank and close the phase.
    ///
    /// Players who chose to continue, or never chose, keep riding. The
    /// round ends once nobody is left riding; otherwise the bank carries
    /// over and the next active player rolls. Does nothing outside the
    /// decision phase.
    pub fn resolve_decisions(&mut self) {
        let (turn, decisions) = match &mut self.phase {
            Phase::Deciding { turn, decisions } => (*turn, std::mem::take(decisions)),
            _ => return,
        };
        self.phase = Phase::Rolling { turn };

        let bank = self.round.bank;
        let mut banked = Vec::new();
        for player in &mut self.players {
            if !player.has_banked && decisions.get(&player.id) == Some(&Decision::Bank) {
                player.score = player.score.saturating_add(bank);
                player.has_banked = true;
                banked.push(player.nickname.clone());
            }
        }
        for name in banked {
            info!("{}: {name} banked ${bank}", self.code());
            self.push_event(GameEvent::Banked { name, amount: bank });
        }

        if self.players.iter().all(|player| player.has_banked) {
            self.round.bank = 0;
            self.end_round();
        } else {
            self.move_to_next_player();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{GameCode, RollValue};

    /// Three players, three safe rolls made, decisions open with P0 on turn.
    fn deciding_game() -> (GameState, Vec<PlayerId>) {
        let mut state = GameState::new(GameCode::new("DISCO"), 5);
        let ids: Vec<PlayerId> = ["Ada", "Bob", "Cy"]
            .iter()
            .map(|name| state.join(name, "🎲", None).unwrap())
            .collect();
        state.start_game(ids[0]).unwrap();
        state.apply_roll(ids[0], RollValue::Sum(2)).unwrap();
        state.apply_roll(ids[1], RollValue::Sum(3)).unwrap();
        state.apply_roll(ids[2], RollValue::Sum(5)).unwrap();
        (state, ids)
    }

    #[test]
    fn test_decision_outside_phase_is_rejected() {
        let mut state = GameState::new(GameCode::new("DISCO"), 5);
        let p1 = state.join("Ada", "🦊", None).unwrap();
        assert_eq!(
            state.submit_decision(p1, Decision::Bank),
            Err(GameError::DecisionPhaseInactive)
        );
    }

    #[test]
    fn test_unknown_player_is_rejected() {
        let (mut state, _) = deciding_game();
        assert_eq!(
            state.submit_decision(PlayerId::new(), Decision::Bank),
            Err(GameError::PlayerNotFound)
        );
    }

    #[test]
    fn test_resubmission_replaces_choice() {
        let (mut state, ids) = deciding_game();
        state.submit_decision(ids[0], Decision::Bank).unwrap();
        state.submit_decision(ids[0], Decision::Continue).unwrap();
        let decisions = state.pending_decisions().unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions.get(&ids[0]), Some(&Decision::Continue));
    }

    #[test]
    fn test_resolves_once_everyone_chose() {
        let (mut state, ids) = deciding_game();
        assert_eq!(state.bank(), 10_000);
        state.submit_decision(ids[1], Decision::Bank).unwrap();
        state.submit_decision(ids[2], Decision::Continue).unwrap();
        assert!(state.is_waiting_for_decisions());

        state.submit_decision(ids[0], Decision::Continue).unwrap();

        assert!(!state.is_waiting_for_decisions());
        assert_eq!(state.players()[1].score, 10_000);
        assert!(state.players()[1].has_banked);
        assert_eq!(state.bank(), 10_000);
        // Turn was P2's roll; P0 is next.
        assert_eq!(state.current_player_index(), 0);
    }

    #[test]
    fn test_everyone_banks_ends_round() {
        let (mut state, ids) = deciding_game();
        for id in &ids {
            state.submit_decision(*id, Decision::Bank).unwrap();
        }
        assert!(state.players().iter().all(|player| player.score == 10_000));
        assert!(state.players().iter().all(|player| !player.has_banked));
        assert_eq!(state.bank(), 0);
        assert_eq!(state.rounds_left(), 4);
        assert_eq!(state.current_player_index(), 0);
    }

    #[test]
    fn test_banked_player_cannot_decide_again() {
        let (mut state, ids) = deciding_game();
        state.submit_decision(ids[0], Decision::Bank).unwrap();
        state.submit_decision(ids[1], Decision::Continue).unwrap();
        state.submit_decision(ids[2], Decision::Continue).unwrap();

        state.apply_roll(ids[1], RollValue::Sum(4)).unwrap();
        assert!(state.is_waiting_for_decisions());
        assert_eq!(
            state.submit_decision(ids[0], Decision::Bank),
            Err(GameError::AlreadyBanked)
        );

        // Only two players are still riding.
        state.submit_decision(ids[1], Decision::Continue).unwrap();
        state.submit_decision(ids[2], Decision::Bank).unwrap();
        assert!(!state.is_waiting_for_decisions());
        assert_eq!(state.players()[0].score, 10_000);
        assert_eq!(state.players()[2].score, 14_000);
        assert_eq!(state.current_player_index(), 1);
    }

    #[test]
    fn test_manual_resolution_leaves_undecided_players_riding() {
        let (mut state, ids) = deciding_game();
        state.submit_decision(ids[2], Decision::Bank).unwrap();
        state.resolve_decisions();

        assert!(!state.is_waiting_for_decisions());
        assert!(!state.players()[0].has_banked);
        assert!(!state.players()[1].has_banked);
        assert!(state.players()[2].has_banked);
        assert_eq!(state.current_player_index(), 0);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let (mut state, ids) = deciding_game();
        state.submit_decision(ids[0], Decision::Bank).unwrap();
        state.resolve_decisions();
        let scores: Vec<_> = state.players().iter().map(|player| player.score).collect();
        let bank = state.bank();

        state.resolve_decisions();

        let again: Vec<_> = state.players().iter().map(|player| player.score).collect();
        assert_eq!(scores, again);
        assert_eq!(bank, state.bank());
    }
}
