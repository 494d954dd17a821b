//! Connection management for push clients.
//!
//! Tracks connected sockets and the session each one follows.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};

use vademecum_domain::{ConnectionId, SessionId, UserId};
use vademecum_shared::ServerEvent;

/// Information about a connected client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub session_id: SessionId,
}

/// Manages all active push connections.
#[derive(Default)]
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, (ConnectionInfo, mpsc::Sender<String>)>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection.
    pub async fn register(&self, info: ConnectionInfo, sender: mpsc::Sender<String>) {
        let mut connections = self.connections.write().await;
        connections.insert(info.connection_id, (info, sender));
        tracing::debug!(
            connection_id = %info.connection_id,
            session_id = %info.session_id,
            "Connection registered"
        );
    }

    /// Unregister a connection.
    pub async fn unregister(&self, connection_id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if connections.remove(&connection_id).is_some() {
            tracing::debug!(connection_id = %connection_id, "Connection unregistered");
        }
    }

    pub async fn get(&self, connection_id: ConnectionId) -> Option<ConnectionInfo> {
        let connections = self.connections.read().await;
        connections.get(&connection_id).map(|(info, _)| *info)
    }

    /// All connections following a session.
    pub async fn session_connections(&self, session_id: SessionId) -> Vec<ConnectionInfo> {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|(info, _)| info.session_id == session_id)
            .map(|(info, _)| *info)
            .collect()
    }

    /// Broadcast an event to every connection following a session.
    pub async fn broadcast_to_session(&self, session_id: SessionId, event: &ServerEvent) {
        let frame = match event.encode() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Failed to encode push event");
                return;
            }
        };

        let connections = self.connections.read().await;
        for (info, sender) in connections.values() {
            if info.session_id != session_id {
                continue;
            }
            if let Err(e) = sender.try_send(frame.clone()) {
                tracing::warn!(
                    connection_id = %info.connection_id,
                    error = %e,
                    "Failed to broadcast push event"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(session_id: SessionId) -> ConnectionInfo {
        ConnectionInfo {
            connection_id: ConnectionId::new(),
            user_id: UserId::new(),
            session_id,
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_only_session_members() {
        let manager = ConnectionManager::new();
        let session = SessionId::new();
        let (member_tx, mut member_rx) = mpsc::channel(4);
        let (other_tx, mut other_rx) = mpsc::channel(4);
        manager.register(info(session), member_tx).await;
        manager.register(info(SessionId::new()), other_tx).await;

        manager
            .broadcast_to_session(session, &ServerEvent::RollsDeleted)
            .await;

        let frame = member_rx.recv().await.unwrap();
        assert_eq!(
            ServerEvent::decode(&frame).unwrap(),
            ServerEvent::RollsDeleted
        );
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_removes_connection() {
        let manager = ConnectionManager::new();
        let session = SessionId::new();
        let connection = info(session);
        let (tx, _rx) = mpsc::channel(4);
        manager.register(connection, tx).await;

        assert_eq!(manager.session_connections(session).await, vec![connection]);
        manager.unregister(connection.connection_id).await;

        assert!(manager.get(connection.connection_id).await.is_none());
        assert!(manager.session_connections(session).await.is_empty());
    }
}
