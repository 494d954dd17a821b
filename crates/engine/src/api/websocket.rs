//! Push socket endpoint.
//!
//! `GET /ws?sessionId=<id>` with the principal in `x-user-id`. Admission is
//! checked before the upgrade: no principal is `403`, a missing or malformed
//! session id is `400`. Admitted sockets receive every push event for their
//! session and get `PONG` for each `{"action":"ping"}`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::QueryRejection,
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use vademecum_domain::{ConnectionId, SessionId, UserId};
use vademecum_shared::{ClientMessage, ServerEvent};

use crate::api::connections::ConnectionInfo;
use crate::api::http::{ApiError, Principal};
use crate::app::App;

/// Buffer size for per-connection message channels.
const CONNECTION_CHANNEL_BUFFER: usize = 256;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsParams {
    pub session_id: Option<String>,
}

/// Resolve who is connecting and to which session.
fn admit(headers: &HeaderMap, params: Option<WsParams>) -> Result<(UserId, SessionId), ApiError> {
    let Principal(user_id) = Principal::from_headers(headers).ok_or(ApiError::Unauthorized)?;
    let session_id = params
        .and_then(|params| params.session_id)
        .and_then(|raw| raw.trim().parse().ok())
        .ok_or(ApiError::InvalidQueryParams)?;
    Ok((user_id, session_id))
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    params: Result<Query<WsParams>, QueryRejection>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let (user_id, session_id) = match admit(&headers, params.ok().map(|Query(params)| params)) {
        Ok(admitted) => admitted,
        Err(e) => return e.into_response(),
    };
    if let Err(e) = app.get_session(session_id) {
        return ApiError::from(e).into_response();
    }
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let info = ConnectionInfo {
        connection_id: ConnectionId::new(),
        user_id,
        session_id,
    };
    ws.on_upgrade(move |socket| handle_socket(socket, app, info))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, app: Arc<App>, info: ConnectionInfo) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let connection_id = info.connection_id;

    let (tx, mut rx) = mpsc::channel::<String>(CONNECTION_CHANNEL_BUFFER);
    app.connections().register(info, tx.clone()).await;

    tracing::info!(
        connection_id = %connection_id,
        session_id = %info.session_id,
        user_id = %info.user_id,
        "WebSocket connection established"
    );

    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(ClientMessage::Ping) => match ServerEvent::Pong.encode() {
                    Ok(pong) => {
                        if tx.try_send(pong).is_err() {
                            tracing::warn!(
                                connection_id = %connection_id,
                                "Failed to send PONG, channel full or closed"
                            );
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "Failed to encode PONG"),
                },
                Err(e) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "Failed to parse message");
                }
            },
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    app.connections().unregister(connection_id).await;
    send_task.abort();

    tracing::info!(connection_id = %connection_id, "WebSocket connection terminated");
}
