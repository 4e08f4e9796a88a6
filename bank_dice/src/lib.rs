//! # Bank Dice
//!
//! A multiplayer banking dice game engine with one authoritative actor per
//! game.
//!
//! Players take turns reporting dice rolls that grow a shared bank. The
//! first three rolls of a round are safe, and a seven among them pays a
//! bonus. After that every roll opens a secret bank-or-continue decision
//! for everyone still riding, and a seven breaks the round and forfeits
//! the bank for whoever hasn't banked yet.
//!
//! ## Architecture
//!
//! A game moves through four phases:
//!
//! - **Lobby**: Waiting for players to join
//! - **Rolling**: The current player reports a roll
//! - **Deciding**: Everyone still riding secretly banks or continues
//! - **GameOver**: Final standings until the game is reset
//!
//! ## Core Modules
//!
//! - [`game`]: Rules engine, entities, and game state
//! - [`instance`]: Per-game actors, subscriptions, and the game manager
//! - [`db`]: Game stores
//! - [`nickname`]: Nickname generation for joining players
//!
//! ## Example
//!
//! ```
//! use bank_dice::game::{GameCode, GameState, RollValue};
//!
//! let mut game = GameState::new(GameCode::new("taco"), 10);
//! let ada = game.join("Ada", "🦊", None).unwrap();
//! let bob = game.join("Bob", "🐻", None).unwrap();
//! game.start_game(ada).unwrap();
//! game.apply_roll(ada, RollValue::SEVEN).unwrap();
//! assert_eq!(game.bank(), 70_000);
//! assert_eq!(game.current_player().unwrap().id, bob);
//! ```

/// Game persistence.
pub mod db;

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    Decision, GameCode, GameError, GameRecord, GameResult, GameState, Phase, PlayerId, RollValue,
    constants,
};

/// Game actors and their manager.
pub mod instance;
pub use instance::{GameConfig, GameManager, GameUpdate, InstanceError, Intent, Subscription};

pub mod nickname;
