pub mod handlers;
pub mod host;
pub mod player;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;

/// Addressing handle for one connection: the id the registry binds an
/// identity to, plus the sender feeding the connection's writer task. The
/// socket itself stays owned by [`handle_socket`].
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: String,
    pub tx: mpsc::UnboundedSender<Message>,
}

impl ConnectionHandle {
    /// Serialize and queue a message for this connection. Best-effort: a
    /// closed writer is ignored.
    pub fn send(&self, msg: &ServerMessage) {
        match serde_json::to_string(msg) {
            Ok(json) => {
                let _ = self.tx.send(Message::Text(json.into()));
            }
            Err(err) => tracing::warn!("failed to serialize server message: {err}"),
        }
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection until it closes, then release
/// its registry binding.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps broadcasts flowing even while we await
    // inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let conn = ConnectionHandle {
        id: ulid::Ulid::new().to_string(),
        tx: outbound_tx,
    };
    tracing::info!("connection {} opened", conn.id);

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(msg) => {
                    if let Some(reply) = handlers::handle_message(msg, &conn, &state).await {
                        conn.send(&reply);
                    }
                }
                Err(err) => {
                    // Fail open: one bad client must not disturb the session.
                    tracing::warn!("dropping malformed message on {}: {err}", conn.id);
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = conn.tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(_)) => {
                tracing::info!("connection {} closed", conn.id);
                break;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!("websocket error on {}: {err}", conn.id);
                break;
            }
        }
    }

    state.disconnect(&conn.id).await;

    // Dropping the last sender winds the writer task down.
    drop(conn);
    let _ = writer_task.await;
}
