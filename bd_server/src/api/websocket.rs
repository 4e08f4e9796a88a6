//! WebSocket handler for following a game live.
//!
//! Viewers are read-only: players act through the HTTP API, and every
//! committed change reaches all viewers of the game as a JSON snapshot.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws/{code}`
//! 2. Server subscribes to the game, answering `404` for an unknown code
//! 3. The current snapshot is sent right away, then every later one in
//!    commit order. A viewer that falls behind skips to the latest.
//! 4. When the game is deleted the server sends `{"type": "not_found"}`
//!    and closes the socket
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:3000/ws/TACO');
//!
//! ws.onmessage = (event) => {
//!   const data = JSON.parse(event.data);
//!   if (data.type === 'not_found') {
//!     showGameGone();
//!   } else {
//!     renderGame(data.state, data.decided, data.results);
//!   }
//! };
//! ```

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use bank_dice::{GameCode, Subscription};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde::Serialize;

use super::{AppState, games::error_response};

/// Notices sent to viewers besides snapshots
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerNotice {
    /// The game was deleted. No more messages follow.
    NotFound,
}

/// Upgrade to a WebSocket following the game `code`.
///
/// # Response
///
/// On success, upgrades connection to WebSocket protocol (101 Switching Protocols).
/// Returns `404 Not Found` if no live game has this code.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let code = GameCode::new(&code);
    match state.games.subscribe(&code).await {
        Ok(subscription) => {
            ws.on_upgrade(move |socket| handle_socket(socket, code, subscription))
        }
        Err(err) => error_response(err).into_response(),
    }
}

/// Relay snapshots until the game is deleted or the viewer goes away.
async fn handle_socket(socket: WebSocket, code: GameCode, subscription: Subscription) {
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket connected: game={}", code);

    let send_code = code.clone();
    let mut send_task = tokio::spawn(async move {
        let mut updates = Box::pin(subscription.into_stream());
        while let Some(item) = updates.next().await {
            let json = match item {
                Ok(update) => match serde_json::to_string(update.as_ref()) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize update for game {}: {}", send_code, e);
                        continue;
                    }
                },
                Err(_) => {
                    if let Ok(json) = serde_json::to_string(&ServerNotice::NotFound) {
                        let _ = sender.send(Message::Text(json.into())).await;
                    }
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut send_task => break,
            msg = receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Text(_))) => {
                    debug!("Ignoring message from viewer of game {}", code);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket error on game {}: {}", code, e);
                    break;
                }
            },
        }
    }

    send_task.abort();

    info!("WebSocket disconnected: game={}", code);
}
