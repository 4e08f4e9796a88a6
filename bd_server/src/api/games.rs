//! Game API handlers.
//!
//! Each intent endpoint forwards one [`Intent`] to the game's actor and
//! returns the committed snapshot it produced. Rejected intents change
//! nothing.
//!
//! # Examples
//!
//! Create a game and join it:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/games \
//!   -H "Content-Type: application/json" -d '{"numRounds": 5}'
//!
//! curl -X POST http://localhost:3000/api/v1/games/TACO/join \
//!   -H "Content-Type: application/json" -d '{"name": "Ada", "avatar": "🦊"}'
//! ```
//!
//! Report a roll:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/games/TACO/roll \
//!   -H "Content-Type: application/json" \
//!   -H "Idempotency-Key: 1b4e28ba-2fa1-11d2-883f-0016d3cca427" \
//!   -d '{"playerId": "...", "value": "double"}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use bank_dice::{
    Decision, GameCode, GameError, GameUpdate, InstanceError, Intent, PlayerId, RollValue,
    instance::{GameSummary, IntentOutcome},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::AppState;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    #[serde(default)]
    pub num_rounds: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CreateGameResponse {
    pub code: GameCode,
}

#[derive(Debug, Deserialize)]
pub struct JoinGameRequest {
    pub name: String,
    #[serde(default)]
    pub avatar: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRequest {
    pub player_id: PlayerId,
}

/// `value` is a dice sum from 2 to 12 or `"double"`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollRequest {
    pub player_id: PlayerId,
    pub value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub player_id: PlayerId,
    pub decision: Decision,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundsRequest {
    pub player_id: PlayerId,
    pub num_rounds: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    /// The player who acted. For a join, the new player's ID.
    pub player_id: PlayerId,
    pub update: GameUpdate,
}

impl From<IntentOutcome> for IntentResponse {
    fn from(outcome: IntentOutcome) -> Self {
        Self {
            player_id: outcome.player_id,
            update: Arc::unwrap_or_clone(outcome.update),
        }
    }
}

/// Map a game error to its HTTP status and a client-safe message.
///
/// - `400 Bad Request`: malformed input such as an impossible roll
/// - `404 Not Found`: unknown game or player
/// - `409 Conflict`: the intent isn't allowed in the current state
/// - `503 Service Unavailable`: the store rejected the commit
pub fn error_response(err: InstanceError) -> ApiError {
    let status = match &err {
        InstanceError::Game(
            GameError::InvalidRoll(_) | GameError::InvalidRoundCount { .. } | GameError::EmptyName,
        ) => StatusCode::BAD_REQUEST,
        InstanceError::Game(GameError::PlayerNotFound) | InstanceError::NotFound(_) => {
            StatusCode::NOT_FOUND
        }
        InstanceError::Game(_) => StatusCode::CONFLICT,
        InstanceError::Commit(_) => StatusCode::SERVICE_UNAVAILABLE,
        InstanceError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        log::warn!("Request failed: {}", err);
    }
    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

/// Read the optional `Idempotency-Key` header.
///
/// # Errors
///
/// `400 Bad Request` if the header is present but not a UUID.
fn idempotency_key(headers: &HeaderMap) -> Result<Option<Uuid>, ApiError> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .map(Some)
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Idempotency-Key must be a UUID".to_string(),
                }),
            )
        })
}

async fn submit(
    state: &AppState,
    code: &str,
    headers: &HeaderMap,
    intent: Intent,
) -> Result<Json<IntentResponse>, ApiError> {
    let key = idempotency_key(headers)?;
    state
        .games
        .submit(&GameCode::new(code), intent, key)
        .await
        .map(|outcome| Json(outcome.into()))
        .map_err(error_response)
}

/// List all live games, ordered by code.
pub async fn list_games(State(state): State<AppState>) -> Json<Vec<GameSummary>> {
    Json(state.games.list_games().await)
}

/// Create a game in the lobby.
///
/// # Request Body
///
/// ```json
/// {"numRounds": 10}
/// ```
///
/// `numRounds` is optional and must be between 1 and 50.
///
/// # Response
///
/// Returns `201 Created` with `{"code": "TACO"}`.
pub async fn create_game(
    State(state): State<AppState>,
    Json(request): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<CreateGameResponse>), ApiError> {
    let code = state
        .games
        .create_game(request.num_rounds)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(CreateGameResponse { code })))
}

/// Latest committed snapshot of a game. Secret decisions are never included.
pub async fn get_game(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<GameUpdate>, ApiError> {
    state
        .games
        .snapshot(&GameCode::new(&code))
        .await
        .map(|update| Json(Arc::unwrap_or_clone(update)))
        .map_err(error_response)
}

/// Delete a game. Its viewers are disconnected.
pub async fn delete_game(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .games
        .delete_game(&GameCode::new(&code))
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(error_response)
}

/// Join a game's lobby. The response carries the new player's ID, which
/// every later intent must present.
pub async fn join_game(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(request): Json<JoinGameRequest>,
) -> Result<Json<IntentResponse>, ApiError> {
    let key = idempotency_key(&headers)?;
    state
        .games
        .join(&GameCode::new(&code), &request.name, &request.avatar, key)
        .await
        .map(|outcome| Json(outcome.into()))
        .map_err(error_response)
}

pub async fn start_game(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(request): Json<PlayerRequest>,
) -> Result<Json<IntentResponse>, ApiError> {
    let intent = Intent::Start {
        player_id: request.player_id,
    };
    submit(&state, &code, &headers, intent).await
}

/// Report the current player's roll.
///
/// # Errors
///
/// - `400 Bad Request`: `value` is not 2-12 or `"double"`
/// - `409 Conflict`: not this player's turn, including while decisions
///   are pending
pub async fn roll(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(request): Json<RollRequest>,
) -> Result<Json<IntentResponse>, ApiError> {
    let value: RollValue = serde_json::from_value(request.value)
        .map_err(|e| error_response(GameError::InvalidRoll(e.to_string()).into()))?;
    let intent = Intent::Roll {
        player_id: request.player_id,
        value,
    };
    submit(&state, &code, &headers, intent).await
}

/// Record a secret bank-or-continue choice.
pub async fn decide(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<IntentResponse>, ApiError> {
    let intent = Intent::Decide {
        player_id: request.player_id,
        decision: request.decision,
    };
    submit(&state, &code, &headers, intent).await
}

pub async fn exit_game(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(request): Json<PlayerRequest>,
) -> Result<Json<IntentResponse>, ApiError> {
    let intent = Intent::Exit {
        player_id: request.player_id,
    };
    submit(&state, &code, &headers, intent).await
}

pub async fn reset_game(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(request): Json<PlayerRequest>,
) -> Result<Json<IntentResponse>, ApiError> {
    let intent = Intent::Reset {
        player_id: request.player_id,
    };
    submit(&state, &code, &headers, intent).await
}

pub async fn configure_rounds(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(request): Json<RoundsRequest>,
) -> Result<Json<IntentResponse>, ApiError> {
    let intent = Intent::ConfigureRounds {
        player_id: request.player_id,
        num_rounds: request.num_rounds,
    };
    submit(&state, &code, &headers, intent).await
}
