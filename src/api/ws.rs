//! WebSocket endpoint streaming workflow status events.
//!
//! Every connected client receives the full event stream as JSON text
//! frames. A client that falls behind gets a `lagged` notice and keeps
//! receiving from the current position; a client that disconnects is
//! dropped silently. Neither case affects running workflows.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::events::StatusEvent;

use super::routes::AppState;

/// Upgrade handler for `GET /api/ws`.
pub async fn status_ws(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let rx = state.events.subscribe();
    ws.on_upgrade(move |socket| handle_status_socket(socket, rx))
}

async fn handle_status_socket(socket: WebSocket, mut rx: broadcast::Receiver<StatusEvent>) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!("failed to serialize status event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "status listener lagged");
                    let notice = serde_json::json!({
                        "type": "lagged",
                        "skipped": skipped,
                    });
                    if sender.send(Message::Text(notice.to_string())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            message = receiver.next() => match message {
                // Clients only listen; tolerate pings and ignore the rest.
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}
