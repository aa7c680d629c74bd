// SPDX-License-Identifier: Apache-2.0
//! The WebSocket session boundary: upgrades a connection, decodes inbound
//! frames into [`crate::hub::Incoming`] messages, and drives a dedicated
//! writer task off the session's outbox.
//!
//! Grounded on the teacher's `handle_socket` (`echo-session-ws-gateway`):
//! the split-socket plus mpsc-backed writer task carries over unchanged.
//! What differs is the upstream — the teacher forwards to a Unix-socket
//! session service; this server *is* the session service, so inbound
//! frames are decoded in place and handed to [`crate::hub::Hub`] instead of
//! being reframed onto another transport.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use session_proto::ClientEnvelope;
use tokio::sync::mpsc;

use crate::hub::{Hub, Incoming};

/// Shared application state handed to every axum handler.
pub struct AppState {
    /// The single mutex-guarded session hub.
    pub hub: Hub,
    /// Accepted `Origin` header values; `None` allows every origin
    /// (including requests with no `Origin` header at all), matching the
    /// teacher's own default when no allowlist is configured.
    pub allow_origins: Option<Vec<String>>,
}

/// Upgrades an incoming request to a WebSocket connection, after checking
/// the request's `Origin` header against `state.allow_origins`.
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    if !origin_allowed(&state, &headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state)).into_response()
}

fn origin_allowed(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(allow) = &state.allow_origins else {
        return true;
    };
    headers
        .get("origin")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|origin| allow.iter().any(|allowed| allowed == origin))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<Vec<u8>>(64);

    let writer = tokio::spawn(async move {
        while let Some(bytes) = out_rx.recv().await {
            let text = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => break,
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let session = state.hub.connect(out_tx).await;
    tracing::info!(session = session.0, "session connected");

    while let Some(message) = ws_rx.next().await {
        let Ok(message) = message else {
            break;
        };
        let incoming = match message {
            Message::Text(text) => decode_envelope(session, text.as_bytes()),
            Message::Binary(bytes) => decode_envelope(session, &bytes),
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => continue,
        };
        state.hub.push(incoming).await;
    }

    state.hub.disconnect(session).await;
    writer.abort();
    tracing::info!(session = session.0, "session disconnected");
}

fn decode_envelope(session: crate::hub::SessionId, bytes: &[u8]) -> Incoming {
    match session_proto::wire::decode::<ClientEnvelope>(bytes) {
        Ok(ClientEnvelope::Auth(payload)) => Incoming::Auth { session, payload },
        Ok(ClientEnvelope::Command(command)) => Incoming::Command { session, command },
        Ok(ClientEnvelope::PolicyUpdate(update)) => Incoming::PolicyUpdate {
            session,
            client_type: update.client_type,
        },
        Ok(ClientEnvelope::RequestFullState {}) => Incoming::RequestFullState { session },
        Err(err) => {
            tracing::debug!(%err, "failed to decode inbound frame");
            Incoming::ProtocolError { session }
        }
    }
}
