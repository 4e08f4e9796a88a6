use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::constants::{self, MAX_NAME_LENGTH};

/// Type alias for whole dollars in the bank and in player scores.
pub type Money = u64;

/// Stable identifier of a player within one game.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl From<Uuid> for PlayerId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// Human-memorable game identifier. Always stored upper-cased so
/// "taco" and "TACO" name the same game.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct GameCode(String);

impl GameCode {
    #[must_use]
    pub fn new(s: &str) -> Self {
        Self(s.trim().to_ascii_uppercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for GameCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<&str> for GameCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for GameCode {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// A reported dice roll: the sum of both dice, or a double.
///
/// On the wire a sum is a bare number (`7`) and a double is the
/// string `"double"`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "RawRoll", into = "RawRoll")]
pub enum RollValue {
    Sum(u8),
    Double,
}

impl RollValue {
    pub const SEVEN: Self = Self::Sum(7);

    /// Validate a dice sum. Two dice can only show 2 through 12.
    pub fn sum(value: u8) -> Result<Self, InvalidRoll> {
        if (2..=12).contains(&value) {
            Ok(Self::Sum(value))
        } else {
            Err(InvalidRoll(value.to_string()))
        }
    }

    #[must_use]
    pub const fn is_seven(&self) -> bool {
        matches!(self, Self::Sum(7))
    }
}

impl fmt::Display for RollValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sum(value) => write!(f, "{value}"),
            Self::Double => write!(f, "double"),
        }
    }
}

impl FromStr for RollValue {
    type Err = InvalidRoll;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("double") {
            return Ok(Self::Double);
        }
        s.parse::<u8>()
            .map_err(|_| InvalidRoll(s.to_string()))
            .and_then(Self::sum)
    }
}

/// A roll value that isn't a dice sum or a double.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid roll {0}, expected 2-12 or double")]
pub struct InvalidRoll(pub String);

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum RawRoll {
    Number(u8),
    Word(String),
}

impl TryFrom<RawRoll> for RollValue {
    type Error = InvalidRoll;

    fn try_from(value: RawRoll) -> Result<Self, Self::Error> {
        match value {
            RawRoll::Number(value) => Self::sum(value),
            RawRoll::Word(word) => word.parse(),
        }
    }
}

impl From<RollValue> for RawRoll {
    fn from(value: RollValue) -> Self {
        match value {
            RollValue::Sum(value) => Self::Number(value),
            RollValue::Double => Self::Word("double".to_string()),
        }
    }
}

/// A player's secret choice once the decision phase opens.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Bank,
    Continue,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Bank => "bank",
            Self::Continue => "continue",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Display alias. Same as `name` when no nickname could be generated.
    pub nickname: String,
    pub avatar: String,
    /// Cumulative banked winnings. Never decreases during a game.
    pub score: Money,
    pub has_banked: bool,
    pub doubles: u32,
    pub break7s: u32,
    pub initial7s: u32,
    pub normal_rolls: u32,
}

impl Player {
    #[must_use]
    pub fn new(name: &str, avatar: &str, nickname: Option<&str>) -> Self {
        let name = clip_name(name);
        let nickname = nickname
            .map(clip_name)
            .filter(|nickname| !nickname.is_empty())
            .unwrap_or_else(|| name.clone());
        Self {
            id: PlayerId::new(),
            name,
            nickname,
            avatar: avatar.trim().to_string(),
            score: 0,
            has_banked: false,
            doubles: 0,
            break7s: 0,
            initial7s: 0,
            normal_rolls: 0,
        }
    }

    pub(crate) fn reset_counters(&mut self) {
        self.score = 0;
        self.has_banked = false;
        self.doubles = 0;
        self.break7s = 0;
        self.initial7s = 0;
        self.normal_rolls = 0;
    }
}

fn clip_name(name: &str) -> String {
    name.trim().chars().take(MAX_NAME_LENGTH).collect()
}

/// Something notable that happened while applying an intent. Events
/// are drained after every transition and shipped alongside the new
/// snapshot so displays can animate them.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    Joined { name: String },
    Left { name: String },
    RoundsConfigured { num_rounds: u32 },
    GameStarted,
    Rolled { name: String, value: RollValue },
    RoundBroken { name: String, forfeited: Money },
    DecisionPhaseOpened,
    Banked { name: String, amount: Money },
    RoundEnded { rounds_left: u32 },
    GameOver { winner: Option<String> },
    GameReset,
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Joined { name } => format!("{name} joined the game"),
            Self::Left { name } => format!("{name} left the game"),
            Self::RoundsConfigured { num_rounds } => format!("game set to {num_rounds} rounds"),
            Self::GameStarted => "game started".to_string(),
            Self::Rolled { name, value } => format!("{name} rolled {value}"),
            Self::RoundBroken { name, forfeited } => {
                format!("{name} rolled a late seven, ${forfeited} forfeited")
            }
            Self::DecisionPhaseOpened => "bank or continue?".to_string(),
            Self::Banked { name, amount } => format!("{name} banked ${amount}"),
            Self::RoundEnded { rounds_left } => format!("round over, {rounds_left} left"),
            Self::GameOver { winner: Some(name) } => format!("game over, {name} wins"),
            Self::GameOver { winner: None } => "game over".to_string(),
            Self::GameReset => "game reset".to_string(),
        };
        write!(f, "{repr}")
    }
}

/// Pick a code for a new game that doesn't collide with `taken`.
///
/// Words are tried in random order; once every word is in use a numeric
/// suffix is appended.
pub fn pick_game_code<R, F>(rng: &mut R, is_taken: F) -> GameCode
where
    R: rand::Rng + ?Sized,
    F: Fn(&GameCode) -> bool,
{
    use rand::seq::SliceRandom;

    let mut words = constants::CODE_WORDS.to_vec();
    words.shuffle(rng);
    let mut suffix = 1u32;
    loop {
        for word in &words {
            let code = if suffix == 1 {
                GameCode::new(word)
            } else {
                GameCode::new(&format!("{word}{suffix}"))
            };
            if !is_taken(&code) {
                return code;
            }
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    // === RollValue Tests ===

    #[test]
    fn test_roll_value_accepts_dice_sums() {
        for value in 2..=12 {
            assert_eq!(RollValue::sum(value), Ok(RollValue::Sum(value)));
        }
    }

    #[test]
    fn test_roll_value_rejects_impossible_sums() {
        assert!(RollValue::sum(0).is_err());
        assert!(RollValue::sum(1).is_err());
        assert!(RollValue::sum(13).is_err());
    }

    #[test]
    fn test_roll_value_parse() {
        assert_eq!("double".parse(), Ok(RollValue::Double));
        assert_eq!(" DOUBLE ".parse(), Ok(RollValue::Double));
        assert_eq!("7".parse(), Ok(RollValue::SEVEN));
        assert!("triple".parse::<RollValue>().is_err());
        assert!("14".parse::<RollValue>().is_err());
    }

    #[test]
    fn test_roll_value_json_shape() {
        assert_eq!(serde_json::to_string(&RollValue::Sum(8)).unwrap(), "8");
        assert_eq!(
            serde_json::to_string(&RollValue::Double).unwrap(),
            "\"double\""
        );
        let parsed: RollValue = serde_json::from_str("11").unwrap();
        assert_eq!(parsed, RollValue::Sum(11));
        let parsed: RollValue = serde_json::from_str("\"double\"").unwrap();
        assert_eq!(parsed, RollValue::Double);
        assert!(serde_json::from_str::<RollValue>("1").is_err());
    }

    // === Player Tests ===

    #[test]
    fn test_player_nickname_falls_back_to_name() {
        let player = Player::new("  Ada ", "🦊", None);
        assert_eq!(player.name, "Ada");
        assert_eq!(player.nickname, "Ada");

        let player = Player::new("Ada", "🦊", Some("   "));
        assert_eq!(player.nickname, "Ada");

        let player = Player::new("Ada", "🦊", Some("Ada Lovelace-Lace"));
        assert_eq!(player.nickname, "Ada Lovelace-Lace");
    }

    #[test]
    fn test_player_name_is_clipped() {
        let player = Player::new(&"x".repeat(100), "🦊", None);
        assert_eq!(player.name.chars().count(), MAX_NAME_LENGTH);
    }

    #[test]
    fn test_player_json_field_names() {
        let player = Player::new("Ada", "🦊", None);
        let json = serde_json::to_value(&player).unwrap();
        for field in ["hasBanked", "break7s", "initial7s", "normalRolls", "doubles"] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
    }

    // === GameCode Tests ===

    #[test]
    fn test_game_code_is_case_insensitive() {
        assert_eq!(GameCode::new("taco"), GameCode::new(" TACO"));
    }

    #[test]
    fn test_pick_game_code_avoids_taken_codes() {
        let mut rng = rand::rng();
        let taken: HashSet<GameCode> = constants::CODE_WORDS
            .iter()
            .map(|word| GameCode::new(word))
            .collect();
        let code = pick_game_code(&mut rng, |code| taken.contains(code));
        assert!(!taken.contains(&code));
        assert!(code.as_str().ends_with('2'));
    }
}
