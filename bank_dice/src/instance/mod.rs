//! Game instances with an async actor per game.
//!
//! This module implements:
//! - GameActor: sole writer of one game's state
//! - GameManager: spawns, finds, and deletes game actors
//! - Subscription: live feed of a game's committed snapshots
//!
//! ## Architecture
//!
//! Each game runs in its own Tokio task draining an mpsc inbox in FIFO
//! order. An intent is applied to a copy of the state, the copy is
//! committed to the [`GameStore`](crate::db::GameStore), and only then
//! does it become current and go out to subscribers on a broadcast
//! channel. Handles are cheap to clone and can be shared freely.
//!
//! ## Example
//!
//! ```no_run
//! use bank_dice::db::MemoryGameStore;
//! use bank_dice::instance::{GameConfig, GameManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = GameManager::new(Arc::new(MemoryGameStore::new()), GameConfig::default());
//!     let code = manager.create_game(None).await.unwrap();
//!     let outcome = manager.join(&code, "Ada", "🦊", None).await.unwrap();
//!     println!("{} joined {}", outcome.player_id, code);
//! }
//! ```

pub mod actor;
pub mod config;
pub mod errors;
pub mod manager;
pub mod messages;
pub mod subscription;

pub use actor::{GameActor, GameHandle};
pub use config::GameConfig;
pub use errors::{InstanceError, InstanceResult};
pub use manager::{GameManager, GameSummary};
pub use messages::{GameMessage, GameUpdate, Intent, IntentOutcome};
pub use subscription::Subscription;
