//! Push transport port - one socket per session
//!
//! The connection manager owns lifecycle ordering; the transport only opens a
//! socket and exposes it as channels plus a close handle.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use vademecum_domain::SessionId;
use vademecum_shared::ProtocolError;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to connect: {0}")]
    Connect(String),
    #[error("Not connected")]
    NotConnected,
    #[error("Connection closed")]
    Closed,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// An open socket.
///
/// - `outbound`: text frames to send
/// - `inbound`: text frames received; ends when the socket closes for any reason
/// - `shutdown`: request a close
/// - `task`: finishes once the socket is fully closed
pub struct PushLink {
    pub outbound: mpsc::Sender<String>,
    pub inbound: mpsc::Receiver<String>,
    pub shutdown: oneshot::Sender<()>,
    pub task: JoinHandle<()>,
}

impl PushLink {
    /// Request a close and wait until the socket task has finished.
    pub async fn close(shutdown: oneshot::Sender<()>, task: JoinHandle<()>) {
        let _ = shutdown.send(());
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Push socket task ended abnormally");
        }
    }
}

#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Open a push connection for `session_id`.
    async fn open(&self, session_id: SessionId) -> Result<PushLink, ConnectionError>;
}
