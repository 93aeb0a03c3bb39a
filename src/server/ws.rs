//! WebSocket session handler.
//!
//! One connection is one session. Outbound events are drained from the
//! session's registry channel by a forwarding task; inbound frames are
//! processed on the connection task until the client goes away.

use super::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use scour_search::{InboundMessage, OutboundMessage, ResultSink, SearchEvent, SessionId};
use std::sync::Arc;
use tokio::sync::mpsc;

pub(super) async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let session = SessionId::new(uuid::Uuid::new_v4().to_string());
    tracing::debug!(%session, "websocket connected");

    let outgoing_rx = state
        .registry
        .register(session.clone(), state.session_buffer)
        .await;

    let (ws_sink, ws_stream) = socket.split();
    let outgoing = tokio::spawn(forward_outgoing(ws_sink, outgoing_rx));

    process_incoming(ws_stream, &session, &state).await;

    tracing::debug!(%session, "websocket disconnected");
    state.registry.unregister(&session).await;
    outgoing.abort();
}

async fn forward_outgoing(
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut outgoing_rx: mpsc::Receiver<SearchEvent>,
) {
    while let Some(event) = outgoing_rx.recv().await {
        let message = OutboundMessage::from(event);
        match serde_json::to_string(&message) {
            Ok(json) => {
                if ws_sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize outbound message");
            }
        }
    }
}

async fn process_incoming(
    mut ws_stream: SplitStream<WebSocket>,
    session: &SessionId,
    state: &AppState,
) {
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => handle_text(text.as_str(), session, state).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(%session, error = %e, "websocket receive failed");
                break;
            }
        }
    }
}

async fn handle_text(text: &str, session: &SessionId, state: &AppState) {
    let message = match serde_json::from_str::<InboundMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(%session, error = %e, "failed to parse client message");
            state
                .registry
                .deliver(
                    session,
                    SearchEvent::SessionError {
                        message: format!("Invalid message format: {e}"),
                    },
                )
                .await;
            return;
        }
    };

    if !message.is_search() {
        tracing::debug!(%session, action = ?message.action, "ignoring unknown action");
        return;
    }

    let term = message.term.unwrap_or_default();
    let sink: Arc<dyn ResultSink> = state.registry.clone();
    let handle = state
        .orchestrator
        .start_search(&term, session.clone(), sink)
        .await;
    if handle.is_empty() {
        return;
    }

    let session = session.clone();
    tokio::spawn(async move {
        let states = handle.wait().await;
        tracing::debug!(%session, ?states, "search finished");
    });
}
