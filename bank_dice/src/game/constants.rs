use super::entities::Money;

/// Rounds played when a game is created without an explicit round count.
pub const DEFAULT_NUM_ROUNDS: u32 = 10;

/// Upper bound accepted when configuring the number of rounds.
pub const MAX_NUM_ROUNDS: u32 = 50;

pub const MIN_PLAYERS: usize = 2;

/// Rolls in a round after which sevens break the round and the
/// bank-or-continue decision opens after every roll.
pub const SAFE_ROLLS: u32 = 3;

/// Bank payout for a seven rolled during the safe rolls.
pub const EARLY_SEVEN_BONUS: Money = 70_000;

/// Bank payout per pip for any other sum.
pub const PIP_VALUE: Money = 1_000;

/// Player names are clipped to this many characters.
pub const MAX_NAME_LENGTH: usize = 32;

/// Words used as human-memorable game codes.
pub const CODE_WORDS: &[&str] = &[
    "TACO", "PIZZA", "NINJA", "DISCO", "HIPPO", "BANJO", "KAZOO", "IGLOO", "LLAMA", "YOYO",
    "BURP", "TOOT", "BONK", "ZONK", "HONK", "BOOP", "ZOOP", "FLOP", "DERP", "BLOB", "GOOP",
    "SLIME", "OOZE", "GUNK", "MUCK", "DORK", "NERD", "GEEK", "WONK", "NOOB", "DUDE", "DAWG",
];
