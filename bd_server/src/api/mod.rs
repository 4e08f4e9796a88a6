//! HTTP/WebSocket API for the bank dice server.
//!
//! Players act through REST endpoints; viewers follow a game over a
//! read-only WebSocket. Every game is driven by its own actor inside the
//! shared [`GameManager`], so handlers only forward intents and relay
//! replies.
//!
//! # Endpoints Overview
//!
//! ## Games
//! - `GET /api/v1/games` - List live games
//! - `POST /api/v1/games` - Create a game
//! - `GET /api/v1/games/{code}` - Latest snapshot
//! - `DELETE /api/v1/games/{code}` - Delete a game
//! - `POST /api/v1/games/{code}/join` - Join the lobby
//! - `POST /api/v1/games/{code}/start` - Start the game (creator only)
//! - `POST /api/v1/games/{code}/roll` - Report a roll
//! - `POST /api/v1/games/{code}/decision` - Bank or continue
//! - `POST /api/v1/games/{code}/exit` - Leave the game
//! - `POST /api/v1/games/{code}/reset` - Back to the lobby (creator only)
//! - `POST /api/v1/games/{code}/rounds` - Change the round count (creator only)
//!
//! Intent endpoints accept an optional `Idempotency-Key` header holding a
//! UUID. A retried request with the same key gets the original reply.
//!
//! ## WebSocket
//! - `GET /ws/{code}` - Follow a game's snapshots
//!
//! ## Health Check
//! - `GET /health` - Server health status
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use bank_dice::{GameConfig, GameManager, db::MemoryGameStore};
//! use bd_server::api::{AppState, create_router};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let games = GameManager::new(Arc::new(MemoryGameStore::new()), GameConfig::default());
//! let app = create_router(AppState {
//!     games: Arc::new(games),
//! });
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod games;
pub mod request_id;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use bank_dice::GameManager;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub games: Arc<GameManager>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// ```text
/// GET    /health
/// GET    /api/v1/games
/// POST   /api/v1/games
/// GET    /api/v1/games/{code}
/// DELETE /api/v1/games/{code}
/// POST   /api/v1/games/{code}/join
/// POST   /api/v1/games/{code}/start
/// POST   /api/v1/games/{code}/roll
/// POST   /api/v1/games/{code}/decision
/// POST   /api/v1/games/{code}/exit
/// POST   /api/v1/games/{code}/reset
/// POST   /api/v1/games/{code}/rounds
/// GET    /ws/{code}
/// ```
pub fn create_router(state: AppState) -> Router {
    let root_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ws/{code}", get(websocket::websocket_handler));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", create_v1_router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/games", get(games::list_games).post(games::create_game))
        .route(
            "/games/{code}",
            get(games::get_game).delete(games::delete_game),
        )
        .route("/games/{code}/join", post(games::join_game))
        .route("/games/{code}/start", post(games::start_game))
        .route("/games/{code}/roll", post(games::roll))
        .route("/games/{code}/decision", post(games::decide))
        .route("/games/{code}/exit", post(games::exit_game))
        .route("/games/{code}/reset", post(games::reset_game))
        .route("/games/{code}/rounds", post(games::configure_rounds))
}

/// Health check endpoint for monitoring and load balancers.
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","version":"1.0.0","games":3,"timestamp":"2026-10-19T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let game_count = state.games.game_count().await;

    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "games": game_count,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}
