// ============================
// meetlink-backend-lib/src/ws_router.rs
// ============================
//! WebSocket router and connection handling.
use crate::metrics::{WS_ACTIVE, WS_CONNECTION, WS_DISCONNECTION};
use crate::relay::SignalingHandler;
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use meetlink_common::ClientEvent;
use metrics::{counter, gauge};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Create the WebSocket router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Handler for WebSocket connections
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    // Counted here rather than at the upgrade request: a handshake that
    // never completes must not move the active gauge.
    counter!(WS_CONNECTION).increment(1);
    gauge!(WS_ACTIVE).increment(1.0);

    let (mut tx, mut rx) = socket.split();

    // Outbound events are funneled through an unbounded channel so the
    // registry's critical sections never wait on a slow peer socket.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let handler = SignalingHandler::new(state.clone());
    state.sessions.register(handler.conn_id(), event_tx);

    // Forward outbound events onto the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "failed to serialize outbound event");
                    continue;
                },
            };
            if tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Process inbound frames until the transport goes away
    while let Some(Ok(message)) = rx.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => handler.handle_event(event).await,
                Err(e) => {
                    // Malformed frames are absorbed, not answered: the only
                    // user-facing error event is the end-meeting rejection.
                    debug!(conn = %handler.conn_id(), error = %e, "malformed frame ignored");
                },
            },
            Message::Close(_) => break,
            // binary, ping and pong frames carry no protocol events
            _ => {},
        }
    }

    // Transport-level disconnect is the sole cleanup trigger
    handler.handle_disconnect();

    counter!(WS_DISCONNECTION).increment(1);
    gauge!(WS_ACTIVE).decrement(1.0);

    send_task.abort();
}
