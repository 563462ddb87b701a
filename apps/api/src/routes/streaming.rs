//! WebSocket fan-out (spec §6, §9): a single `/stream` endpoint
//! replacing the teacher's SSE module (`routes/streaming.rs`). Upgraded
//! to native `axum::extract::ws` because reconnect recovery needs a
//! client-sent `messages_since` request, which is bidirectional -- SSE
//! cannot serve it. Grounded on `original_source/backend/src/api/
//! websocket.py`'s `ConnectionManager.emit_*`/`get_messages_since` and
//! `jejakcuan_audit::bus::EventBus`, which already implements the
//! sequence counter and replay ring this handler streams from.

use crate::AppState;
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn streaming_routes() -> Router<Arc<AppState>> {
    Router::new().route("/stream", get(upgrade))
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Inbound control message a client may send to recover missed frames
/// after a reconnect, e.g. `{"type":"resume","since_seq":42}`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Resume { since_seq: u64 },
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let connected = state
        .event_bus
        .publish("connected", serde_json::json!({}))
        .await;
    if socket
        .send(Message::Text(serde_json::to_string(&connected).unwrap_or_default()))
        .await
        .is_err()
    {
        return;
    }

    let mut rx = state.event_bus.subscribe();

    loop {
        tokio::select! {
            frame = rx.recv() => {
                match frame {
                    Ok(frame) => {
                        let json = serde_json::to_string(&frame).unwrap_or_default();
                        if socket.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(ClientMessage::Resume { since_seq }) = serde_json::from_str(&text) {
                            let missed = state.event_bus.messages_since(since_seq).await;
                            for frame in missed {
                                let json = serde_json::to_string(&frame).unwrap_or_default();
                                if socket.send(Message::Text(json)).await.is_err() {
                                    return;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }
}
