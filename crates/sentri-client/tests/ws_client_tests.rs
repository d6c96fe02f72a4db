use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sentri_client::ws::{
    ClientEvent, ConnectionState, FrameSink, FrameStream, TransportFuture, WsConnection, WsTransport,
};
use sentri_client::{ClientError, SubscriptionId, WsClient, WsConfig};
use sentri_protocol::{lifecycle, LiveMessage, Topic};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Mock transport
// ---------------------------------------------------------------------------

/// Server side of one mocked connection.
struct ServerEnd {
    to_client: mpsc::UnboundedSender<String>,
    from_client: mpsc::UnboundedReceiver<String>,
    client_closed: Arc<AtomicBool>,
}

impl ServerEnd {
    fn push(&self, text: &str) {
        self.to_client.send(text.to_string()).unwrap();
    }
}

enum Script {
    Accept,
    Refuse,
}

#[derive(Clone, Default)]
struct MockTransport {
    connects: Arc<AtomicUsize>,
    script: Arc<Mutex<VecDeque<Script>>>,
    servers: Arc<Mutex<VecDeque<ServerEnd>>>,
}

impl MockTransport {
    fn scripted(script: impl IntoIterator<Item = Script>) -> Self {
        let transport = Self::default();
        transport.script.lock().unwrap().extend(script);
        transport
    }

    fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn take_server(&self) -> ServerEnd {
        self.servers.lock().unwrap().pop_front().expect("no accepted connection")
    }
}

struct MockSink {
    tx: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

impl FrameSink for MockSink {
    fn send_text<'a>(&'a mut self, text: String) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            self.tx
                .send(text)
                .map_err(|e| ClientError::Transport(e.to_string()))
        })
    }

    fn close<'a>(&'a mut self) -> TransportFuture<'a, ()> {
        self.closed.store(true, Ordering::SeqCst);
        Box::pin(async { Ok(()) })
    }
}

struct MockStream {
    rx: mpsc::UnboundedReceiver<String>,
}

impl FrameStream for MockStream {
    fn next_frame<'a>(
        &'a mut self,
    ) -> Pin<Box<dyn Future<Output = Option<Result<String, ClientError>>> + Send + 'a>> {
        Box::pin(async move { self.rx.recv().await.map(Ok) })
    }
}

impl WsTransport for MockTransport {
    fn connect<'a>(&'a self, _url: &'a str) -> TransportFuture<'a, WsConnection> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front().unwrap_or(Script::Refuse);
        Box::pin(async move {
            match step {
                Script::Refuse => Err(ClientError::Transport("connection refused".into())),
                Script::Accept => {
                    let (to_client, client_rx) = mpsc::unbounded_channel();
                    let (client_tx, from_client) = mpsc::unbounded_channel();
                    let closed = Arc::new(AtomicBool::new(false));
                    self.servers.lock().unwrap().push_back(ServerEnd {
                        to_client,
                        from_client,
                        client_closed: Arc::clone(&closed),
                    });
                    Ok(WsConnection {
                        sink: Box::new(MockSink { tx: client_tx, closed }),
                        stream: Box::new(MockStream { rx: client_rx }),
                    })
                }
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn client(transport: &MockTransport) -> WsClient {
    WsClient::with_transport(
        WsConfig {
            url: "ws://mock/ws".into(),
            ..Default::default()
        },
        transport.clone(),
    )
}

fn counter(client: &WsClient, topic: &str) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    client.on(topic, move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    count
}

fn recorder(client: &WsClient, topic: &str, label: &'static str, log: &Arc<Mutex<Vec<String>>>) {
    let log = Arc::clone(log);
    client.on(topic, move |event| {
        let kind = event.message().map(|m| m.kind().to_string()).unwrap_or_default();
        log.lock().unwrap().push(format!("{label}:{kind}"));
    });
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_connect_opens_and_emits_connected() {
    let transport = MockTransport::scripted([Script::Accept]);
    let client = client(&transport);
    let connected = counter(&client, lifecycle::CONNECTED);
    assert_eq!(client.state(), ConnectionState::Idle);

    client.connect();
    assert_eq!(client.state(), ConnectionState::Connecting);
    client.connect();
    settle().await;

    assert_eq!(client.state(), ConnectionState::Open);
    assert!(client.is_connected());
    assert_eq!(transport.connects(), 1, "connect while connecting is a no-op");
    assert_eq!(connected.load(Ordering::SeqCst), 1);

    client.connect();
    settle().await;
    assert_eq!(transport.connects(), 1, "connect while open is a no-op");
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_exhaustion_emits_single_failure() {
    let transport = MockTransport::scripted([Script::Accept]);
    let client = client(&transport);
    let disconnected = counter(&client, lifecycle::DISCONNECTED);
    let errors = counter(&client, lifecycle::ERROR);
    let failed = Arc::new(Mutex::new(Vec::new()));
    {
        let failed = Arc::clone(&failed);
        client.on(lifecycle::RECONNECT_FAILED, move |event| {
            failed.lock().unwrap().push(event.clone());
        });
    }

    client.connect();
    settle().await;
    assert!(client.is_connected());

    // Abnormal close: the server goes away and every reconnect is refused.
    drop(transport.take_server());
    settle().await;
    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(client.reconnect_attempts(), 1);

    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(transport.connects(), 6, "initial connect plus five reconnects");
    assert_eq!(client.reconnect_attempts(), 5);
    assert_eq!(errors.load(Ordering::SeqCst), 5);
    assert_eq!(disconnected.load(Ordering::SeqCst), 6);
    assert_eq!(
        *failed.lock().unwrap(),
        vec![ClientEvent::ReconnectFailed { attempts: 5 }]
    );

    client.connect();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.connects(), 6, "connect is ignored once exhausted");
    assert_eq!(failed.lock().unwrap().len(), 1);

    client.reset_reconnect_attempts();
    client.connect();
    settle().await;
    assert_eq!(transport.connects(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_uses_fixed_delay() {
    let transport = MockTransport::scripted([Script::Accept, Script::Refuse, Script::Accept]);
    let client = client(&transport);
    client.connect();
    settle().await;

    let start = tokio::time::Instant::now();
    drop(transport.take_server());
    settle().await;
    assert_eq!(transport.connects(), 1);

    tokio::time::sleep(Duration::from_millis(2_900)).await;
    assert_eq!(transport.connects(), 1, "no reconnect before the delay");
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(transport.connects(), 2);
    assert!(start.elapsed() >= Duration::from_millis(3_000));

    tokio::time::sleep(Duration::from_millis(3_000)).await;
    assert_eq!(transport.connects(), 3);
    assert!(client.is_connected());
    assert_eq!(client.reconnect_attempts(), 0, "counter resets on open");
}

#[tokio::test(start_paused = true)]
async fn test_malformed_frame_does_not_stop_dispatch() {
    let transport = MockTransport::scripted([Script::Accept]);
    let client = client(&transport);
    let alerts = Arc::new(Mutex::new(Vec::new()));
    {
        let alerts = Arc::clone(&alerts);
        client.on(Topic::Alert.as_str(), move |event| {
            if let Some(LiveMessage::Alert(alert)) = event.live() {
                alerts.lock().unwrap().push(alert.id);
            }
        });
    }
    client.connect();
    settle().await;

    let server = transport.take_server();
    server.push("{not json");
    server.push("[1, 2, 3]");
    server.push(r#"{"payload": "no type"}"#);
    server.push(r#"{"type": "alert", "id": "ALT-101", "severity": "high", "message": "Overcrowding at Gate B"}"#);
    settle().await;

    assert_eq!(*alerts.lock().unwrap(), vec!["ALT-101".to_string()]);
    assert!(client.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_typed_subscribers_run_before_catch_all() {
    let transport = MockTransport::scripted([Script::Accept]);
    let client = client(&transport);
    let log = Arc::new(Mutex::new(Vec::new()));
    recorder(&client, lifecycle::MESSAGE, "all", &log);
    recorder(&client, "crowd_update", "typed", &log);
    recorder(&client, "crowd_update", "typed2", &log);
    client.connect();
    settle().await;

    let server = transport.take_server();
    server.push(r#"{"type": "crowd_update", "zone": "Main Stage", "density": 91.5}"#);
    server.push(r#"{"type": "heartbeat"}"#);
    settle().await;

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "typed:crowd_update".to_string(),
            "typed2:crowd_update".to_string(),
            "all:crowd_update".to_string(),
            "all:heartbeat".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_send_requires_open_connection() {
    let transport = MockTransport::scripted([Script::Accept]);
    let client = client(&transport);

    assert!(matches!(client.subscribe_to_alerts(), Err(ClientError::NotConnected)));

    client.connect();
    assert!(matches!(client.subscribe_to_camera("CAM-001"), Err(ClientError::NotConnected)));
    settle().await;

    let mut server = transport.take_server();
    assert!(server.from_client.try_recv().is_err(), "nothing queued while closed");

    client.subscribe_to_camera("CAM-002").unwrap();
    client.unsubscribe_from_camera("CAM-002").unwrap();
    client.subscribe_to_alerts().unwrap();
    settle().await;

    let sent: Vec<serde_json::Value> = std::iter::from_fn(|| server.from_client.try_recv().ok())
        .map(|text| serde_json::from_str(&text).unwrap())
        .collect();
    assert_eq!(
        sent,
        vec![
            serde_json::json!({"type": "subscribe_camera", "camera_id": "CAM-002"}),
            serde_json::json!({"type": "unsubscribe_camera", "camera_id": "CAM-002"}),
            serde_json::json!({"type": "subscribe_alerts"}),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_closes_without_reconnect() {
    let transport = MockTransport::scripted([Script::Accept, Script::Accept]);
    let client = client(&transport);
    let disconnected = counter(&client, lifecycle::DISCONNECTED);
    let failed = counter(&client, lifecycle::RECONNECT_FAILED);
    client.connect();
    settle().await;
    let server = transport.take_server();

    client.disconnect();
    assert_eq!(client.state(), ConnectionState::Closed);
    assert!(matches!(client.subscribe_to_alerts(), Err(ClientError::NotConnected)));
    settle().await;

    assert!(server.client_closed.load(Ordering::SeqCst), "socket closed");
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.connects(), 1);
    assert_eq!(disconnected.load(Ordering::SeqCst), 1);
    assert_eq!(failed.load(Ordering::SeqCst), 0);

    client.disconnect();
    assert_eq!(disconnected.load(Ordering::SeqCst), 1, "disconnect is idempotent");

    client.connect();
    settle().await;
    assert!(client.is_connected(), "explicit connect after disconnect");
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_while_connecting_cancels_attempt() {
    let transport = MockTransport::scripted([Script::Refuse]);
    let client = client(&transport);
    let errors = counter(&client, lifecycle::ERROR);

    client.connect();
    client.disconnect();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(errors.load(Ordering::SeqCst), 0);
    assert!(transport.connects() <= 1);
}

#[tokio::test(start_paused = true)]
async fn test_off_inside_callback_does_not_deadlock() {
    let transport = MockTransport::scripted([Script::Accept]);
    let client = client(&transport);
    let calls = Arc::new(AtomicUsize::new(0));
    let own_id: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
    {
        let handle = client.clone();
        let calls = Arc::clone(&calls);
        let own_id_cb = Arc::clone(&own_id);
        let id = client.on("alert", move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = own_id_cb.lock().unwrap().take() {
                assert!(handle.off("alert", id));
            }
            let _ = handle.subscribe_to_alerts();
        });
        *own_id.lock().unwrap() = Some(id);
    }
    client.connect();
    settle().await;

    let server = transport.take_server();
    server.push(r#"{"type": "alert", "id": "A1"}"#);
    server.push(r#"{"type": "alert", "id": "A2"}"#);
    settle().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.listener_count("alert"), 0);
}

#[tokio::test]
async fn test_duplicate_registrations_are_kept() {
    let client = WsClient::new(WsConfig::default());
    let a = client.on("camera_frame", |_| {});
    let b = client.on("camera_frame", |_| {});
    assert_ne!(a, b);
    assert_eq!(client.listener_count("camera_frame"), 2);

    assert!(client.off("camera_frame", a));
    assert!(!client.off("camera_frame", a));
    assert!(!client.off("alert", b));
    assert_eq!(client.listener_count("camera_frame"), 1);
}

#[test]
fn test_default_config_targets_local_backend() {
    let config = WsConfig::default();
    assert_eq!(config.url, "ws://localhost:8000/ws");
    assert_eq!(config.max_reconnect_attempts, 5);
    assert_eq!(config.reconnect_delay, Duration::from_millis(3_000));
}
