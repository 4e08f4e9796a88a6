//! Final standings and end-of-game titles.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use super::entities::{Money, Player, PlayerId};
use super::state_machine::GameState;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    /// 1-based. Players with equal scores share a rank.
    pub rank: usize,
    pub player_id: PlayerId,
    pub name: String,
    pub avatar: String,
    pub score: Money,
}

/// A tongue-in-cheek award for the player with the most of some roll.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    pub title: String,
    pub player_id: PlayerId,
    pub name: String,
    pub count: u32,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResults {
    pub standings: Vec<Standing>,
    pub winner: Option<Standing>,
    pub titles: Vec<Title>,
}

fn break7s(player: &Player) -> u32 {
    player.break7s
}

fn doubles(player: &Player) -> u32 {
    player.doubles
}

fn initial7s(player: &Player) -> u32 {
    player.initial7s
}

const TITLES: [(&str, fn(&Player) -> u32); 3] = [
    ("Master of Disaster", break7s),
    ("Double Trouble King", doubles),
    ("Lucky 7 Charmer", initial7s),
];

impl GameState {
    /// Highest score, earliest in turn order on a tie.
    #[must_use]
    pub fn winner(&self) -> Option<&Player> {
        self.players.iter().min_by_key(|player| Reverse(player.score))
    }

    /// Players ordered by score, ties kept in turn order.
    #[must_use]
    pub fn standings(&self) -> Vec<Standing> {
        let mut players: Vec<&Player> = self.players.iter().collect();
        players.sort_by_key(|player| Reverse(player.score));

        let mut standings: Vec<Standing> = Vec::with_capacity(players.len());
        for (idx, player) in players.into_iter().enumerate() {
            let rank = match standings.last() {
                Some(prev) if prev.score == player.score => prev.rank,
                _ => idx + 1,
            };
            standings.push(Standing {
                rank,
                player_id: player.id,
                name: player.nickname.clone(),
                avatar: player.avatar.clone(),
                score: player.score,
            });
        }
        standings
    }

    /// Titles earned so far. A title nobody qualified for is left out.
    #[must_use]
    pub fn titles(&self) -> Vec<Title> {
        TITLES
            .iter()
            .filter_map(|(title, count_of)| {
                let holder = self
                    .players
                    .iter()
                    .min_by_key(|player| Reverse(count_of(player)))?;
                let count = count_of(holder);
                (count > 0).then(|| Title {
                    title: (*title).to_string(),
                    player_id: holder.id,
                    name: holder.nickname.clone(),
                    count,
                })
            })
            .collect()
    }

    /// Standings, winner, and titles. Only available once the game is over.
    #[must_use]
    pub fn results(&self) -> Option<GameResults> {
        if !self.is_over() {
            return None;
        }
        let standings = self.standings();
        Some(GameResults {
            winner: standings.first().cloned(),
            standings,
            titles: self.titles(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::GameCode;
    use crate::game::state_machine::Phase;

    fn scored(scores: &[Money]) -> GameState {
        let mut state = GameState::new(GameCode::new("KAZOO"), 1);
        for (i, score) in scores.iter().enumerate() {
            let id = state.join(&format!("p{i}"), "🎲", None).unwrap();
            let idx = state.player_index(id).unwrap();
            state.players[idx].score = *score;
        }
        state
    }

    #[test]
    fn test_standings_order_and_shared_rank() {
        let state = scored(&[5_000, 9_000, 5_000, 1_000]);
        let standings = state.standings();
        let names: Vec<&str> = standings.iter().map(|s| s.name.as_str()).collect();
        let ranks: Vec<usize> = standings.iter().map(|s| s.rank).collect();
        assert_eq!(names, ["p1", "p0", "p2", "p3"]);
        assert_eq!(ranks, [1, 2, 2, 4]);
    }

    #[test]
    fn test_winner_tie_goes_to_earliest_player() {
        let state = scored(&[3_000, 8_000, 8_000]);
        assert_eq!(state.winner().unwrap().name, "p1");
    }

    #[test]
    fn test_titles() {
        let mut state = scored(&[0, 0, 0]);
        state.players[0].doubles = 2;
        state.players[1].doubles = 2;
        state.players[2].break7s = 1;

        let titles = state.titles();

        assert_eq!(titles.len(), 2);
        assert_eq!(titles[0].title, "Master of Disaster");
        assert_eq!(titles[0].name, "p2");
        assert_eq!(titles[1].title, "Double Trouble King");
        assert_eq!(titles[1].name, "p0");
        assert_eq!(titles[1].count, 2);
    }

    #[test]
    fn test_results_only_when_over() {
        let mut state = scored(&[2_000, 4_000]);
        assert!(state.results().is_none());

        state.phase = Phase::GameOver;
        let results = state.results().unwrap();
        assert_eq!(results.winner.unwrap().name, "p1");
        assert_eq!(results.standings.len(), 2);
        assert!(results.titles.is_empty());
    }
}
