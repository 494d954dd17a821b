//! Single-slot push connection manager.
//!
//! Holds at most one live connection. `connect` and `disconnect` are
//! serialized behind an async mutex, and an old connection is always fully
//! closed before a new one is opened. Every connection gets a fresh
//! [`ConnectionToken`]; background tasks that outlive their connection see a
//! stale token and stop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;

use vademecum_domain::SessionId;
use vademecum_shared::{ClientMessage, ServerEvent};

use crate::infrastructure::cache::SessionCache;
use crate::ports::outbound::{ConnectionError, PushLink, PushTransport};

pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
}

/// Generation number of one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionToken(u64);

#[derive(Debug, Default)]
struct Generation(AtomicU64);

impl Generation {
    fn advance(&self) -> ConnectionToken {
        ConnectionToken(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn is_current(&self, token: ConnectionToken) -> bool {
        self.0.load(Ordering::SeqCst) == token.0
    }
}

struct ActiveConnection {
    session_id: SessionId,
    token: ConnectionToken,
    outbound: mpsc::Sender<String>,
    shutdown: oneshot::Sender<()>,
    io_task: JoinHandle<()>,
    reader: JoinHandle<()>,
    heartbeat: JoinHandle<()>,
}

impl ActiveConnection {
    async fn close(self) {
        self.heartbeat.abort();
        drop(self.outbound);
        PushLink::close(self.shutdown, self.io_task).await;
        if let Err(e) = self.reader.await {
            tracing::warn!(error = %e, "Push reader ended abnormally");
        }
        tracing::info!(
            session_id = %self.session_id,
            token = self.token.0,
            "Push connection closed"
        );
    }
}

pub struct ConnectionManager {
    transport: Arc<dyn PushTransport>,
    cache: Arc<SessionCache>,
    heartbeat_interval: Duration,
    slot: Mutex<Option<ActiveConnection>>,
    generation: Arc<Generation>,
    state: Arc<watch::Sender<ConnectionState>>,
}

impl ConnectionManager {
    pub fn new(transport: Arc<dyn PushTransport>, cache: Arc<SessionCache>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            transport,
            cache,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            slot: Mutex::new(None),
            generation: Arc::new(Generation::default()),
            state: Arc::new(state),
        }
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch connection state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Session of the live connection, if any.
    pub async fn current_session(&self) -> Option<SessionId> {
        if self.state() != ConnectionState::Connected {
            return None;
        }
        self.slot.lock().await.as_ref().map(|active| active.session_id)
    }

    /// Connect to `session_id`, closing any other connection first.
    pub async fn connect(&self, session_id: SessionId) -> Result<(), ConnectionError> {
        let mut slot = self.slot.lock().await;

        if self.state() == ConnectionState::Connected
            && slot.as_ref().is_some_and(|active| active.session_id == session_id)
        {
            tracing::debug!(session_id = %session_id, "Already connected to session");
            return Ok(());
        }

        if let Some(active) = slot.take() {
            self.generation.advance();
            active.close().await;
        }

        let token = self.generation.advance();
        self.state.send_replace(ConnectionState::Connecting);

        let link = match self.transport.open(session_id).await {
            Ok(link) => link,
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Failed to open push connection");
                self.state.send_replace(ConnectionState::Idle);
                return Err(e);
            }
        };

        self.state.send_replace(ConnectionState::Connected);
        tracing::info!(session_id = %session_id, token = token.0, "Push connection open");

        let PushLink {
            outbound,
            inbound,
            shutdown,
            task,
        } = link;

        let reader = tokio::spawn(read_loop(
            inbound,
            session_id,
            token,
            Arc::clone(&self.generation),
            Arc::clone(&self.cache),
            Arc::clone(&self.state),
        ));
        let heartbeat = tokio::spawn(heartbeat_loop(
            outbound.clone(),
            self.heartbeat_interval,
            token,
            Arc::clone(&self.generation),
        ));

        *slot = Some(ActiveConnection {
            session_id,
            token,
            outbound,
            shutdown,
            io_task: task,
            reader,
            heartbeat,
        });
        Ok(())
    }

    /// Close the live connection, if any.
    pub async fn disconnect(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(active) = slot.take() {
            self.generation.advance();
            active.close().await;
        }
        self.state.send_replace(ConnectionState::Idle);
    }

    /// Send a control message on the live connection.
    pub async fn send(&self, message: ClientMessage) -> Result<(), ConnectionError> {
        let text = message.encode()?;
        let slot = self.slot.lock().await;
        let active = slot
            .as_ref()
            .filter(|_| self.state() == ConnectionState::Connected)
            .ok_or(ConnectionError::NotConnected)?;
        active
            .outbound
            .send(text)
            .await
            .map_err(|_| ConnectionError::Closed)
    }
}

async fn read_loop(
    mut inbound: mpsc::Receiver<String>,
    session_id: SessionId,
    token: ConnectionToken,
    generation: Arc<Generation>,
    cache: Arc<SessionCache>,
    state: Arc<watch::Sender<ConnectionState>>,
) {
    while let Some(text) = inbound.recv().await {
        if !generation.is_current(token) {
            break;
        }
        match ServerEvent::decode(&text) {
            Ok(ServerEvent::Pong) => tracing::debug!(session_id = %session_id, "Heartbeat acknowledged"),
            Ok(ServerEvent::Unknown(tag)) => {
                tracing::warn!(session_id = %session_id, event = %tag, "Dropping unrecognized push event");
            }
            Ok(event) => {
                if let Some(update) = cache.apply(session_id, &event).await {
                    tracing::debug!(session_id = %session_id, ?update, "Applied push event");
                }
            }
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Dropping malformed push event");
            }
        }
    }

    // The socket is gone. Only the current connection may move the slot to Idle.
    state.send_if_modified(|current| {
        if generation.is_current(token) && *current != ConnectionState::Idle {
            tracing::warn!(session_id = %session_id, "Push connection closed by peer");
            *current = ConnectionState::Idle;
            true
        } else {
            false
        }
    });
}

async fn heartbeat_loop(
    outbound: mpsc::Sender<String>,
    interval: Duration,
    token: ConnectionToken,
    generation: Arc<Generation>,
) {
    loop {
        tokio::time::sleep(interval).await;
        if !generation.is_current(token) {
            break;
        }
        let ping = match ClientMessage::Ping.encode() {
            Ok(ping) => ping,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode heartbeat");
                break;
            }
        };
        if outbound.send(ping).await.is_err() {
            break;
        }
        tracing::trace!(token = token.0, "Heartbeat sent");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicBool;

    use async_trait::async_trait;
    use chrono::Utc;
    use vademecum_domain::{CharacterId, DiceFactor, Roll, RollEvaluation};

    /// In-memory transport that records open/close order.
    #[derive(Default)]
    struct FakeTransport {
        log: std::sync::Mutex<Vec<String>>,
        server_side: std::sync::Mutex<HashMap<SessionId, mpsc::Sender<String>>>,
        client_frames: std::sync::Mutex<HashMap<SessionId, mpsc::Receiver<String>>>,
        fail_next: AtomicBool,
    }

    impl FakeTransport {
        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }

        fn push(&self, session_id: SessionId) -> mpsc::Sender<String> {
            self.server_side.lock().unwrap()[&session_id].clone()
        }

        fn drop_peer(&self, session_id: SessionId) {
            self.server_side.lock().unwrap().remove(&session_id);
        }

        fn frames(&self, session_id: SessionId) -> mpsc::Receiver<String> {
            self.client_frames.lock().unwrap().remove(&session_id).unwrap()
        }
    }

    #[async_trait]
    impl PushTransport for Arc<FakeTransport> {
        async fn open(&self, session_id: SessionId) -> Result<PushLink, ConnectionError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(ConnectionError::Connect("refused".to_string()));
            }
            self.log.lock().unwrap().push(format!("open {session_id}"));

            let (outbound, client_rx) = mpsc::channel(8);
            let (server_tx, inbound) = mpsc::channel(8);
            let (shutdown, shutdown_rx) = oneshot::channel();
            self.server_side.lock().unwrap().insert(session_id, server_tx);
            self.client_frames.lock().unwrap().insert(session_id, client_rx);

            let this = Arc::clone(self);
            let task = tokio::spawn(async move {
                let _ = shutdown_rx.await;
                this.server_side.lock().unwrap().remove(&session_id);
                this.log.lock().unwrap().push(format!("close {session_id}"));
            });

            Ok(PushLink {
                outbound,
                inbound,
                shutdown,
                task,
            })
        }
    }

    fn manager(transport: &Arc<FakeTransport>, heartbeat: Duration) -> ConnectionManager {
        ConnectionManager::new(Arc::new(Arc::clone(transport)), Arc::new(SessionCache::new()))
            .with_heartbeat_interval(heartbeat)
    }

    async fn wait_for_state(manager: &ConnectionManager, expected: ConnectionState) {
        let mut rx = manager.subscribe_state();
        tokio::time::timeout(Duration::from_secs(1), rx.wait_for(|state| *state == expected))
            .await
            .expect("state not reached")
            .unwrap();
    }

    #[tokio::test]
    async fn switching_sessions_closes_old_before_opening_new() {
        let transport = Arc::new(FakeTransport::default());
        let manager = manager(&transport, DEFAULT_HEARTBEAT_INTERVAL);
        let a = SessionId::new();
        let b = SessionId::new();

        manager.connect(a).await.unwrap();
        manager.connect(b).await.unwrap();

        assert_eq!(
            transport.log(),
            vec![format!("open {a}"), format!("close {a}"), format!("open {b}")]
        );
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(manager.current_session().await, Some(b));
    }

    #[tokio::test]
    async fn reconnecting_to_same_session_is_noop() {
        let transport = Arc::new(FakeTransport::default());
        let manager = manager(&transport, DEFAULT_HEARTBEAT_INTERVAL);
        let a = SessionId::new();

        manager.connect(a).await.unwrap();
        manager.connect(a).await.unwrap();

        assert_eq!(transport.log(), vec![format!("open {a}")]);
    }

    #[tokio::test]
    async fn disconnect_closes_and_goes_idle() {
        let transport = Arc::new(FakeTransport::default());
        let manager = manager(&transport, DEFAULT_HEARTBEAT_INTERVAL);
        let a = SessionId::new();

        manager.connect(a).await.unwrap();
        manager.disconnect().await;

        assert_eq!(transport.log(), vec![format!("open {a}"), format!("close {a}")]);
        assert_eq!(manager.state(), ConnectionState::Idle);
        assert_eq!(manager.current_session().await, None);
        assert!(matches!(
            manager.send(ClientMessage::Ping).await,
            Err(ConnectionError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn connect_failure_reverts_to_idle() {
        let transport = Arc::new(FakeTransport::default());
        let manager = manager(&transport, DEFAULT_HEARTBEAT_INTERVAL);
        transport.fail_next.store(true, Ordering::SeqCst);

        let result = manager.connect(SessionId::new()).await;

        assert!(matches!(result, Err(ConnectionError::Connect(_))));
        assert_eq!(manager.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn peer_close_goes_idle_without_reconnect() {
        let transport = Arc::new(FakeTransport::default());
        let manager = manager(&transport, DEFAULT_HEARTBEAT_INTERVAL);
        let a = SessionId::new();
        manager.connect(a).await.unwrap();

        transport.drop_peer(a);
        wait_for_state(&manager, ConnectionState::Idle).await;

        assert_eq!(transport.log(), vec![format!("open {a}")]);

        // A later connect to the same session opens a fresh socket.
        manager.connect(a).await.unwrap();
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(transport.log().last(), Some(&format!("open {a}")));
    }

    #[tokio::test]
    async fn heartbeat_pings_current_connection() {
        let transport = Arc::new(FakeTransport::default());
        let manager = manager(&transport, Duration::from_millis(20));
        let a = SessionId::new();
        manager.connect(a).await.unwrap();
        let mut frames = transport.frames(a);

        let frame = tokio::time::timeout(Duration::from_secs(1), frames.recv())
            .await
            .unwrap();

        assert_eq!(frame.as_deref(), Some(r#"{"action":"ping"}"#));
    }

    #[tokio::test]
    async fn stale_heartbeat_stops_after_switch() {
        let transport = Arc::new(FakeTransport::default());
        let manager = manager(&transport, Duration::from_millis(50));
        let a = SessionId::new();
        manager.connect(a).await.unwrap();
        let mut old_frames = transport.frames(a);

        manager.connect(SessionId::new()).await.unwrap();

        // Every sender for the old socket is gone; no ping ever arrives.
        let frame = tokio::time::timeout(Duration::from_secs(1), old_frames.recv())
            .await
            .unwrap();
        assert_eq!(frame, None);
    }

    #[tokio::test]
    async fn inbound_events_reach_cache_and_bad_frames_are_dropped() {
        let transport = Arc::new(FakeTransport::default());
        let cache = Arc::new(SessionCache::new());
        let manager = ConnectionManager::new(Arc::new(Arc::clone(&transport)), Arc::clone(&cache));
        let a = SessionId::new();
        cache.put_rolls(a, vec![]).await;
        let mut updates = cache.subscribe();
        manager.connect(a).await.unwrap();

        let roll = Roll::roll(
            CharacterId::new(),
            "Strength",
            &[DiceFactor::new("Strength", 1)],
            RollEvaluation::Check,
            Utc::now(),
            || 6,
        );
        let server = transport.push(a);
        server.send("garbage".to_string()).await.unwrap();
        server
            .send(r#"{"event":"MAP_UPDATED","data":{}}"#.to_string())
            .await
            .unwrap();
        server
            .send(ServerEvent::RollCreated(roll.clone()).encode().unwrap())
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(1), updates.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cache.rolls(a).await, Some(vec![roll]));
        assert_eq!(manager.state(), ConnectionState::Connected);
    }
}
