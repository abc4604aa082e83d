pub mod handlers;
mod student;
mod teacher;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::error::SessionError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::{ConnId, Role};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub role: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request: role={:?}", params.role);

    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

type WsSender = SplitSink<WebSocket, Message>;

/// Serialize and send one message; false once the socket is gone
async fn send_json(sender: &mut WsSender, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize {}: {}", msg.event_name(), e);
            true
        }
    }
}

async fn send_all(sender: &mut WsSender, messages: &[ServerMessage]) -> bool {
    for msg in messages {
        if !send_json(sender, msg).await {
            return false;
        }
    }
    true
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, params: WsQuery, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let role = match params.role.as_deref() {
        Some("teacher") => Role::Teacher,
        _ => Role::Student,
    };
    let conn: ConnId = ulid::Ulid::new().to_string();

    tracing::info!("Connected: {} as {:?}", conn, role);

    // Subscribe before the initial sync so nothing falls in between
    let (mut broadcast_rx, initial) = state.connect().await;
    if !send_all(&mut sender, &initial).await {
        tracing::error!("Failed to send initial state to {}", conn);
        state.disconnect(&conn).await;
        return;
    }

    loop {
        tokio::select! {
            broadcast_msg = broadcast_rx.recv() => {
                match broadcast_msg {
                    Ok(envelope) => {
                        if envelope.is_for(&conn) && !send_json(&mut sender, &envelope.message).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!("Connection {} lagged by {} messages, resyncing", conn, n);
                        let snapshot = state.resync(&mut broadcast_rx).await;
                        if !send_all(&mut sender, &snapshot).await {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received from {}: {}", conn, text);

                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                handlers::handle_message(client_msg, &conn, role, &state).await
                            }
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                Some(ServerMessage::from(&SessionError::from(e)))
                            }
                        };

                        if let Some(reply) = reply {
                            if !send_json(&mut sender, &reply).await {
                                tracing::error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    state.disconnect(&conn).await;
    tracing::info!("Disconnected: {}", conn);
}
