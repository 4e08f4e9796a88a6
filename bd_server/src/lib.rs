//! HTTP and WebSocket server for bank dice games.
//!
//! The binary wires a [`bank_dice::GameManager`] to a game store and serves
//! [`api::create_router`]; the pieces are exposed here so they can be
//! tested without a socket.

pub mod api;
pub mod config;
pub mod logging;
