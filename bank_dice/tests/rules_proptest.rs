/// Property-based tests for the game rules using proptest
///
/// These tests drive games with random rolls, decisions, and departures and
/// check that the state stays consistent after every step.
use bank_dice::game::{
    Decision, GameCode, GameState, Phase, PlayerId, RollValue,
    constants::{EARLY_SEVEN_BONUS, PIP_VALUE, SAFE_ROLLS},
};
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Clone, Debug)]
enum Step {
    Roll { seat: usize, value: RollValue },
    Decide { seat: usize, decision: Decision },
    Exit { seat: usize },
}

// Strategy to generate any legal roll, doubles included
fn roll_strategy() -> impl Strategy<Value = RollValue> {
    prop_oneof![
        5 => (2u8..=12).prop_map(|pips| RollValue::sum(pips).unwrap()),
        1 => Just(RollValue::Double),
    ]
}

fn decision_strategy() -> impl Strategy<Value = Decision> {
    prop_oneof![Just(Decision::Bank), Just(Decision::Continue)]
}

// Rolls and decisions dominate; departures are rare
fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        6 => (0usize..6, roll_strategy()).prop_map(|(seat, value)| Step::Roll { seat, value }),
        6 => (0usize..6, decision_strategy())
            .prop_map(|(seat, decision)| Step::Decide { seat, decision }),
        1 => (0usize..6).prop_map(|seat| Step::Exit { seat }),
    ]
}

fn started_game(players: usize, rounds: u32) -> GameState {
    let mut state = GameState::new(GameCode::new("PROP"), rounds);
    let mut creator = None;
    for i in 0..players {
        let id = state.join(&format!("p{i}"), "🎲", None).unwrap();
        creator.get_or_insert(id);
    }
    state.start_game(creator.unwrap()).unwrap();
    state
}

/// Apply a step, steering rolls to the current player most of the time so
/// games actually progress.
fn apply(state: &mut GameState, step: &Step) {
    let seat_id = |seat: usize| -> Option<PlayerId> {
        let players = state.players();
        (!players.is_empty()).then(|| players[seat % players.len()].id)
    };
    match *step {
        Step::Roll { seat, value } => {
            let roller = if seat < 5 {
                state.current_player().map(|player| player.id)
            } else {
                seat_id(seat)
            };
            if let Some(id) = roller {
                let _ = state.apply_roll(id, value);
            }
        }
        Step::Decide { seat, decision } => {
            if let Some(id) = seat_id(seat) {
                let _ = state.submit_decision(id, decision);
            }
        }
        Step::Exit { seat } => {
            if state.players().len() > 1
                && let Some(id) = seat_id(seat)
            {
                state.exit(id).unwrap();
            }
        }
    }
}

fn check_invariants(state: &GameState) -> Result<(), TestCaseError> {
    let players = state.players();

    if state.is_started() && !state.is_over() {
        prop_assert!(state.current_player_index() < players.len());
    }
    if let Phase::Rolling { turn } = state.phase() {
        prop_assert!(!players[*turn].has_banked, "banked player holds the turn");
    }
    if let Some(decisions) = state.pending_decisions() {
        for id in decisions.keys() {
            let player = state.player(*id);
            prop_assert!(player.is_some_and(|player| !player.has_banked));
        }
        prop_assert!(decisions.len() < state.active_player_count());
    }
    if state.is_over() {
        prop_assert_eq!(state.rounds_left(), 0);
        prop_assert_eq!(state.bank(), 0);
    }
    if let Some(creator) = state.creator_id() {
        prop_assert!(state.player(creator).is_some());
    }
    Ok(())
}

proptest! {
    #[test]
    fn test_safe_rolls_grow_the_bank(rolls in prop::collection::vec(roll_strategy(), 3)) {
        let mut state = started_game(2, 5);
        let mut expected = 0u64;

        for value in rolls {
            let id = state.current_player().unwrap().id;
            state.apply_roll(id, value).unwrap();
            expected = match value {
                RollValue::Double => expected * 2,
                RollValue::Sum(7) => expected + EARLY_SEVEN_BONUS,
                RollValue::Sum(pips) => expected + u64::from(pips) * PIP_VALUE,
            };
            prop_assert_eq!(state.bank(), expected);
        }

        prop_assert_eq!(state.total_rolls(), SAFE_ROLLS);
        prop_assert!(state.is_waiting_for_decisions());
        prop_assert!(!state.round_broke());
    }

    #[test]
    fn test_late_seven_always_breaks_the_round(
        safe in prop::collection::vec(roll_strategy(), 3),
    ) {
        let mut state = started_game(2, 5);
        for value in safe {
            let id = state.current_player().unwrap().id;
            state.apply_roll(id, value).unwrap();
        }
        let ids: Vec<PlayerId> = state.players().iter().map(|player| player.id).collect();
        for id in &ids {
            state.submit_decision(*id, Decision::Continue).unwrap();
        }
        let roller = state.current_player().unwrap().id;

        state.apply_roll(roller, RollValue::SEVEN).unwrap();

        prop_assert_eq!(state.rounds_left(), 4);
        prop_assert_eq!(state.bank(), 0);
        prop_assert_eq!(state.current_player_index(), 0);
        prop_assert!(state.players().iter().all(|player| player.score == 0));
        prop_assert_eq!(state.player(roller).unwrap().break7s, 1);
    }

    #[test]
    fn test_random_play_keeps_state_consistent(
        players in 2usize..=5,
        rounds in 1u32..=4,
        steps in prop::collection::vec(step_strategy(), 1..200),
    ) {
        let mut state = started_game(players, rounds);
        let mut scores: HashMap<PlayerId, u64> = HashMap::new();

        for step in &steps {
            let rounds_before = state.rounds_left();
            apply(&mut state, step);

            check_invariants(&state)?;

            let rounds_after = state.rounds_left();
            prop_assert!(rounds_after == rounds_before || rounds_after + 1 == rounds_before);
            if rounds_after < rounds_before {
                prop_assert_eq!(state.bank(), 0);
                prop_assert_eq!(state.total_rolls(), 0);
                prop_assert!(state.players().iter().all(|player| !player.has_banked));
            }

            for player in state.players() {
                let previous = scores.insert(player.id, player.score).unwrap_or(0);
                prop_assert!(player.score >= previous, "score went down");
            }

            if state.is_over() {
                prop_assert!(state.results().is_some());
                break;
            }
        }
    }
}
