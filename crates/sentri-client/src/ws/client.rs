use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use sentri_protocol::{
    derive_ws_url, lifecycle, InboundMessage, OutboundCommand, DEFAULT_API_BASE_URL,
    MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY_MS,
};

use super::events::{Callback, ClientEvent, ConnectionState, SubscriptionId};
use super::transport::{TungsteniteTransport, WsConnection, WsTransport};
use crate::ClientError;

/// Settings for [`WsClient`].
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: String,
    /// Automatic reconnects allowed after consecutive closes.
    pub max_reconnect_attempts: u32,
    /// Fixed wait before each reconnect.
    pub reconnect_delay: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: derive_ws_url(DEFAULT_API_BASE_URL),
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            reconnect_delay: Duration::from_millis(RECONNECT_DELAY_MS),
        }
    }
}

enum Outbound {
    Text(String),
    Close,
}

struct Inner {
    state: ConnectionState,
    attempts: u32,
    /// Set once `reconnect_failed` has been emitted.
    exhausted: bool,
    /// Set by `disconnect`; suppresses reconnects until the next `connect`.
    shutdown: bool,
    /// Identifies the current connection. Events from older ones are ignored.
    generation: u64,
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
    task: Option<JoinHandle<()>>,
    reconnect_timer: Option<JoinHandle<()>>,
    listeners: HashMap<String, Vec<(SubscriptionId, Callback)>>,
    next_id: u64,
}

struct Shared {
    config: WsConfig,
    transport: Box<dyn WsTransport>,
    inner: Mutex<Inner>,
}

/// Auto-reconnecting WebSocket client with topic dispatch.
///
/// Cloning yields another handle to the same connection. Nothing here
/// returns an error for transport problems: those surface as `error`,
/// `disconnected` and `reconnect_failed` events.
#[derive(Clone)]
pub struct WsClient {
    shared: Arc<Shared>,
}

impl WsClient {
    pub fn new(config: WsConfig) -> Self {
        Self::with_transport(config, TungsteniteTransport)
    }

    pub fn with_transport<T: WsTransport>(config: WsConfig, transport: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                transport: Box::new(transport),
                inner: Mutex::new(Inner {
                    state: ConnectionState::Idle,
                    attempts: 0,
                    exhausted: false,
                    shutdown: false,
                    generation: 0,
                    outbound: None,
                    task: None,
                    reconnect_timer: None,
                    listeners: HashMap::new(),
                    next_id: 0,
                }),
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.shared.config.url
    }

    /// Open the connection. No-op while connecting or open, and after
    /// reconnection has been exhausted until
    /// [`reset_reconnect_attempts`](Self::reset_reconnect_attempts).
    pub fn connect(&self) {
        let mut inner = self.shared.lock();
        if matches!(inner.state, ConnectionState::Connecting | ConnectionState::Open) {
            return;
        }
        if inner.exhausted {
            tracing::warn!(url = %self.shared.config.url, "Reconnect attempts exhausted, ignoring connect");
            return;
        }
        inner.shutdown = false;
        if let Some(timer) = inner.reconnect_timer.take() {
            timer.abort();
        }
        self.shared.open(&mut inner);
    }

    /// Close the connection and suppress automatic reconnects.
    pub fn disconnect(&self) {
        let mut inner = self.shared.lock();
        inner.attempts = self.shared.config.max_reconnect_attempts;
        inner.shutdown = true;
        if let Some(timer) = inner.reconnect_timer.take() {
            timer.abort();
        }

        let previous = inner.state;
        inner.generation += 1;
        inner.state = ConnectionState::Closed;
        let outbound = inner.outbound.take();
        let task = inner.task.take();
        match previous {
            ConnectionState::Open => {
                if let Some(tx) = outbound {
                    let _ = tx.send(Outbound::Close);
                }
            }
            ConnectionState::Connecting => {
                if let Some(task) = task {
                    task.abort();
                }
            }
            ConnectionState::Idle | ConnectionState::Closed => return,
        }

        tracing::info!(url = %self.shared.config.url, "WebSocket disconnected");
        let callbacks = inner.listeners_for(lifecycle::DISCONNECTED);
        drop(inner);
        Shared::dispatch(&callbacks, &ClientEvent::Disconnected);
    }

    /// Serialize and transmit a record. Fails with
    /// [`ClientError::NotConnected`] unless the connection is open; nothing
    /// is queued.
    pub fn send<T: Serialize + ?Sized>(&self, record: &T) -> Result<(), ClientError> {
        let inner = self.shared.lock();
        let tx = match (&inner.state, &inner.outbound) {
            (ConnectionState::Open, Some(tx)) => tx.clone(),
            _ => {
                tracing::warn!(state = %inner.state, "WebSocket not open, message not sent");
                return Err(ClientError::NotConnected);
            }
        };
        drop(inner);

        let text = serde_json::to_string(record)?;
        tx.send(Outbound::Text(text))
            .map_err(|_| ClientError::NotConnected)
    }

    pub fn send_command(&self, command: &OutboundCommand) -> Result<(), ClientError> {
        tracing::debug!(command = command.kind(), "Sending command");
        self.send(command)
    }

    pub fn subscribe_to_camera(&self, camera_id: &str) -> Result<(), ClientError> {
        self.send_command(&OutboundCommand::SubscribeCamera {
            camera_id: camera_id.to_string(),
        })
    }

    pub fn unsubscribe_from_camera(&self, camera_id: &str) -> Result<(), ClientError> {
        self.send_command(&OutboundCommand::UnsubscribeCamera {
            camera_id: camera_id.to_string(),
        })
    }

    pub fn subscribe_to_alerts(&self) -> Result<(), ClientError> {
        self.send_command(&OutboundCommand::SubscribeAlerts)
    }

    /// Register a callback for a message type or lifecycle topic. The same
    /// callback may be registered more than once and is then called once per
    /// registration.
    pub fn on<F>(&self, topic: &str, callback: F) -> SubscriptionId
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        let mut inner = self.shared.lock();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner
            .listeners
            .entry(topic.to_string())
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove a registration. Returns whether it existed.
    pub fn off(&self, topic: &str, id: SubscriptionId) -> bool {
        let mut inner = self.shared.lock();
        let Some(list) = inner.listeners.get_mut(topic) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        let removed = list.len() != before;
        if list.is_empty() {
            inner.listeners.remove(topic);
        }
        removed
    }

    pub fn listener_count(&self, topic: &str) -> usize {
        self.shared.lock().listeners.get(topic).map_or(0, Vec::len)
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.lock().attempts
    }

    /// Re-arm automatic reconnection after it was exhausted or suppressed.
    pub fn reset_reconnect_attempts(&self) {
        let mut inner = self.shared.lock();
        inner.attempts = 0;
        inner.exhausted = false;
    }

    /// Handle that does not keep the client alive. Callbacks that act on
    /// their own client must capture this rather than a clone.
    pub fn downgrade(&self) -> WeakWsClient {
        WeakWsClient {
            shared: Arc::downgrade(&self.shared),
        }
    }
}

/// Non-owning counterpart of [`WsClient`].
#[derive(Clone)]
pub struct WeakWsClient {
    shared: Weak<Shared>,
}

impl WeakWsClient {
    pub fn upgrade(&self) -> Option<WsClient> {
        self.shared.upgrade().map(|shared| WsClient { shared })
    }
}

impl std::fmt::Debug for WsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.lock();
        f.debug_struct("WsClient")
            .field("url", &self.shared.config.url)
            .field("state", &inner.state)
            .field("attempts", &inner.attempts)
            .finish()
    }
}

impl Inner {
    fn listeners_for(&self, topic: &str) -> Vec<Callback> {
        self.listeners
            .get(topic)
            .map(|list| list.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Callbacks always run without the lock held so they can call back
    /// into the client.
    fn dispatch(callbacks: &[Callback], event: &ClientEvent) {
        for callback in callbacks {
            callback(event);
        }
    }

    fn emit(&self, generation: u64, event: ClientEvent) {
        let inner = self.lock();
        if inner.generation != generation {
            return;
        }
        let callbacks = inner.listeners_for(event.topic());
        drop(inner);
        Self::dispatch(&callbacks, &event);
    }

    fn open(self: &Arc<Self>, inner: &mut Inner) {
        inner.generation += 1;
        inner.state = ConnectionState::Connecting;
        let (tx, rx) = mpsc::unbounded_channel();
        inner.outbound = Some(tx);

        let generation = inner.generation;
        tracing::info!(url = %self.config.url, attempt = inner.attempts, "Connecting WebSocket");
        let shared = Arc::clone(self);
        inner.task = Some(tokio::spawn(async move {
            shared.run(generation, rx).await;
        }));
    }

    async fn run(self: Arc<Self>, generation: u64, mut outbound: mpsc::UnboundedReceiver<Outbound>) {
        let WsConnection { mut sink, mut stream } = match self.transport.connect(&self.config.url).await {
            Ok(connection) => connection,
            Err(e) => {
                self.on_error(generation, e.to_string());
                self.on_close(generation);
                return;
            }
        };

        if !self.on_open(generation) {
            let _ = sink.close().await;
            return;
        }

        loop {
            tokio::select! {
                frame = stream.next_frame() => match frame {
                    Some(Ok(text)) => self.on_text(generation, &text),
                    Some(Err(e)) => {
                        self.on_error(generation, e.to_string());
                        break;
                    }
                    None => break,
                },
                command = outbound.recv() => match command {
                    Some(Outbound::Text(text)) => {
                        if let Err(e) = sink.send_text(text).await {
                            self.on_error(generation, e.to_string());
                            break;
                        }
                    }
                    Some(Outbound::Close) | None => {
                        if let Err(e) = sink.close().await {
                            tracing::debug!(error = %e, "Error closing WebSocket");
                        }
                        break;
                    }
                },
            }
        }

        self.on_close(generation);
    }

    fn on_open(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        inner.state = ConnectionState::Open;
        inner.attempts = 0;
        tracing::info!(url = %self.config.url, "WebSocket connected");
        let callbacks = inner.listeners_for(lifecycle::CONNECTED);
        drop(inner);
        Self::dispatch(&callbacks, &ClientEvent::Connected);
        true
    }

    fn on_text(&self, generation: u64, text: &str) {
        let msg = match InboundMessage::parse(text) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed WebSocket frame");
                return;
            }
        };
        tracing::trace!(kind = msg.kind(), "WebSocket message");

        let typed = msg.kind() != lifecycle::MESSAGE;
        let event = ClientEvent::Message(msg);
        if typed {
            self.emit(generation, event.clone());
        }

        let inner = self.lock();
        if inner.generation != generation {
            return;
        }
        let callbacks = inner.listeners_for(lifecycle::MESSAGE);
        drop(inner);
        Self::dispatch(&callbacks, &event);
    }

    fn on_error(&self, generation: u64, error: String) {
        tracing::warn!(url = %self.config.url, error = %error, "WebSocket error");
        self.emit(generation, ClientEvent::Error(error));
    }

    fn on_close(self: &Arc<Self>, generation: u64) {
        let mut inner = self.lock();
        if inner.generation != generation {
            return;
        }
        inner.state = ConnectionState::Closed;
        inner.outbound = None;
        inner.task = None;
        tracing::info!(url = %self.config.url, "WebSocket closed");
        let disconnected = inner.listeners_for(lifecycle::DISCONNECTED);

        let mut failed = None;
        if !inner.shutdown {
            let max = self.config.max_reconnect_attempts;
            if inner.attempts < max {
                inner.attempts += 1;
                tracing::info!(
                    attempt = inner.attempts,
                    max,
                    delay_ms = self.config.reconnect_delay.as_millis() as u64,
                    "Scheduling WebSocket reconnect"
                );
                self.schedule_reconnect(&mut inner, generation);
            } else if !inner.exhausted {
                inner.exhausted = true;
                tracing::error!(attempts = inner.attempts, "WebSocket reconnect attempts exhausted");
                failed = Some((inner.listeners_for(lifecycle::RECONNECT_FAILED), inner.attempts));
            }
        }
        drop(inner);

        Self::dispatch(&disconnected, &ClientEvent::Disconnected);
        if let Some((callbacks, attempts)) = failed {
            Self::dispatch(&callbacks, &ClientEvent::ReconnectFailed { attempts });
        }
    }

    fn schedule_reconnect(self: &Arc<Self>, inner: &mut Inner, generation: u64) {
        let delay = self.config.reconnect_delay;
        let shared = Arc::clone(self);
        inner.reconnect_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = shared.lock();
            if inner.generation != generation || inner.shutdown || inner.state != ConnectionState::Closed {
                return;
            }
            inner.reconnect_timer = None;
            shared.open(&mut inner);
        }));
    }
}
