//! Bank dice rules engine.
//!
//! The engine turns player intents into new game state:
//! - [`turn`]: applying reported rolls to the bank
//! - [`decisions`]: the simultaneous bank-or-continue phase
//! - [`rounds`]: turn order, round rollover, and the game lifecycle
//! - [`roster`]: joining and leaving
//! - [`standings`]: final standings and titles

pub mod constants;
pub mod decisions;
pub mod entities;
pub mod rounds;
pub mod roster;
pub mod standings;
pub mod state_machine;
pub mod turn;

pub use entities::{Decision, GameCode, GameEvent, Money, Player, PlayerId, RollValue};
pub use standings::{GameResults, Standing, Title};
pub use state_machine::{GameError, GameRecord, GameResult, GameState, Phase, RoundState};
