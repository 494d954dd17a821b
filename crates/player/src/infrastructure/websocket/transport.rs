//! tokio-tungstenite push transport

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, http::HeaderValue, Message},
};
use url::Url;

use vademecum_domain::{SessionId, UserId};
use vademecum_shared::USER_ID_HEADER;

use crate::ports::outbound::{ConnectionError, PushLink, PushTransport};

const CHANNEL_CAPACITY: usize = 64;

/// Opens `{ws_url}?sessionId=<id>` with the principal in the `x-user-id` header.
pub struct TungsteniteTransport {
    ws_url: Url,
    user_id: UserId,
}

impl TungsteniteTransport {
    pub fn new(ws_url: Url, user_id: UserId) -> Self {
        Self { ws_url, user_id }
    }

    fn session_url(&self, session_id: SessionId) -> Url {
        let mut url = self.ws_url.clone();
        url.query_pairs_mut()
            .append_pair("sessionId", &session_id.to_string());
        url
    }
}

#[async_trait]
impl PushTransport for TungsteniteTransport {
    async fn open(&self, session_id: SessionId) -> Result<PushLink, ConnectionError> {
        let url = self.session_url(session_id);
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| ConnectionError::Connect(e.to_string()))?;
        let principal = HeaderValue::from_str(&self.user_id.to_string())
            .map_err(|e| ConnectionError::Connect(e.to_string()))?;
        request.headers_mut().insert(USER_ID_HEADER, principal);

        let (stream, _) = connect_async(request)
            .await
            .map_err(|e| ConnectionError::Connect(e.to_string()))?;
        tracing::info!(url = %url, "Connected to push endpoint");

        let (mut write, mut read) = stream.split();
        let (outbound, mut outbound_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let (inbound_tx, inbound) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let (shutdown, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        if let Err(e) = write.close().await {
                            tracing::debug!(error = %e, "Close handshake failed");
                        }
                        break;
                    }
                    Some(text) = outbound_rx.recv() => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::warn!(error = %e, "Failed to send frame");
                            break;
                        }
                    }
                    frame = read.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            if inbound_tx.send(text).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(?frame, "Server closed push connection");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Push socket error");
                            break;
                        }
                        None => break,
                    },
                }
            }
        });

        Ok(PushLink {
            outbound,
            inbound,
            shutdown,
            task,
        })
    }
}
