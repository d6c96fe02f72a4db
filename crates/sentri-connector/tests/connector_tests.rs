//! End-to-end tests against the mock backend on an ephemeral port.

use std::time::Duration;

use sentri_client::{
    ApiClient, ApiConfig, FetchError, HttpFetcher, PollSnapshot, Poller, WsClient, WsConfig,
};
use sentri_connector::{ConnectorConfig, MockBackend, MockOptions};
use sentri_protocol::{
    derive_ws_url, fallback, lifecycle, CameraState, Endpoint, EventReport, EventSummary,
    LiveMessage, Topic,
};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};

const WAIT: Duration = Duration::from_secs(5);

async fn spawn_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let backend = MockBackend::new(MockOptions {
        push_interval: Duration::from_millis(50),
        seed: Some(7),
    });
    tokio::spawn(async move {
        let _ = backend.serve(listener).await;
    });
    format!("http://{addr}")
}

fn api(base_url: &str) -> ApiClient {
    ApiClient::new(ApiConfig {
        base_url: base_url.to_string(),
        ..Default::default()
    })
    .unwrap()
}

/// Wait for the first settled snapshot that carries data.
async fn settled<T: Clone>(rx: &mut watch::Receiver<PollSnapshot<T>>) -> PollSnapshot<T> {
    tokio::time::timeout(WAIT, async {
        loop {
            {
                let snapshot = rx.borrow_and_update();
                if snapshot.data.is_some() && !snapshot.loading {
                    return snapshot.clone();
                }
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("poller never settled")
}

// ─── HTTP ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_api_client_reads_mock_endpoints() {
    let base = spawn_backend().await;
    let api = api(&base);

    let health = api.health().await.unwrap();
    assert!(health.is_healthy());
    assert!(health.timestamp.is_some());

    let events = api.events().await.unwrap();
    assert_eq!(events, fallback::events());

    let report = api.event_report("event-002").await.unwrap();
    assert_eq!(report.event_id.as_deref(), Some("event-002"));
    assert_eq!(report.crowd_timeline.len(), 10);

    let cameras = api.cameras().await.unwrap();
    assert_eq!(cameras.len(), 9);
    assert!(cameras.iter().any(|c| c.id == "CAM-002" && c.has_alert));

    let status = api.camera_status("CAM-001").await.unwrap();
    assert_eq!(status.camera_id, "CAM-001");
    assert_eq!(status.recording, Some(status.status == CameraState::Online));

    let stats = api.dashboard_stats().await.unwrap();
    assert_eq!(stats.total_cameras, 9);

    let recent = api.recent_alerts(1).await.unwrap();
    assert_eq!(recent.len(), 1);

    // Alerts travel with `type` and `location` over HTTP.
    let alerts = api.alerts().await.unwrap();
    assert!(!alerts.is_empty());
    for alert in &alerts {
        assert!(alert.alert_type.is_some(), "{alert:?}");
        let camera = cameras
            .iter()
            .find(|c| alert.camera_id.as_deref() == Some(c.id.as_str()))
            .unwrap();
        assert_eq!(alert.zone, camera.zone);
    }

    let crowd = api.crowd_live().await.unwrap();
    assert!(!crowd.is_empty());
    assert!(crowd.iter().all(|u| (0.0..=100.0).contains(&u.density)));

    let heatmap = api.heatmap().await.unwrap();
    assert_eq!(heatmap.cells.len(), 20 * 15);
    assert!(heatmap.cells.iter().all(|c| (0.0..=100.0).contains(&c.density)));
}

#[tokio::test]
async fn test_unknown_event_is_status_error() {
    let base = spawn_backend().await;
    match api(&base).event_report("event-404").await {
        Err(FetchError::Status { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected 404, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = api(&format!("http://{addr}")).events().await;
    assert!(matches!(result, Err(FetchError::Network(_))), "got {result:?}");
}

// ─── Poller ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_poller_loads_live_data() {
    let base = spawn_backend().await;
    let poller: Poller<Vec<EventSummary>> = Poller::new(
        HttpFetcher::new(api(&base)),
        |_: &Endpoint| fallback::events(),
        Duration::from_secs(10),
    );
    let mut rx = poller.subscribe();
    poller.start(Endpoint::Events);

    let snapshot = settled(&mut rx).await;
    assert!(!snapshot.is_fallback);
    assert!(snapshot.error.is_none());
    assert_eq!(snapshot.data.map(|e| e.len()), Some(3));
    poller.stop();
}

#[tokio::test]
async fn test_poller_falls_back_for_missing_report() {
    let base = spawn_backend().await;
    let poller: Poller<EventReport> = Poller::new(
        HttpFetcher::new(api(&base)),
        |endpoint: &Endpoint| match endpoint {
            Endpoint::EventReport(id) => fallback::event_report(id),
            _ => EventReport::default(),
        },
        Duration::from_secs(10),
    );
    let mut rx = poller.subscribe();
    poller.start(Endpoint::EventReport("event-404".into()));

    let snapshot = settled(&mut rx).await;
    assert!(snapshot.is_fallback);
    assert!(snapshot.error.as_deref().unwrap_or_default().contains("404"));
    assert_eq!(snapshot.data.and_then(|r| r.event_id).as_deref(), Some("event-404"));

    poller.set_endpoint(Endpoint::EventReport("event-003".into()));
    let recovered = tokio::time::timeout(WAIT, async {
        loop {
            rx.changed().await.unwrap();
            let snapshot = rx.borrow_and_update().clone();
            if !snapshot.loading && !snapshot.is_fallback {
                return snapshot;
            }
        }
    })
    .await
    .expect("poller never recovered");
    assert!(recovered.error.is_none());
    assert_eq!(recovered.source, Some(Endpoint::EventReport("event-003".into())));
    poller.stop();
}

// ─── WebSocket ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ws_client_receives_pushes_and_replies() {
    let base = spawn_backend().await;
    let ws = WsClient::new(WsConfig {
        url: derive_ws_url(&base),
        ..Default::default()
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    for topic in [Topic::CrowdUpdate, Topic::CameraStatus, Topic::CameraFrame] {
        let tx = tx.clone();
        ws.on(topic.as_str(), move |event| {
            if let Some(live) = event.live() {
                let _ = tx.send(live);
            }
        });
    }
    let handle = ws.clone();
    ws.on(lifecycle::CONNECTED, move |_| {
        handle.subscribe_to_camera("CAM-004").unwrap();
    });

    ws.connect();

    let mut saw_crowd = false;
    let mut saw_status = false;
    let mut saw_frame = false;
    tokio::time::timeout(WAIT, async {
        while !(saw_crowd && saw_status && saw_frame) {
            match rx.recv().await.unwrap() {
                LiveMessage::CrowdUpdate(update) => {
                    assert!((0.0..=100.0).contains(&update.density));
                    saw_crowd = true;
                }
                LiveMessage::CameraStatus(status) => {
                    assert_eq!(status.camera_id, "CAM-004");
                    saw_status = true;
                }
                LiveMessage::CameraFrame(frame) => {
                    assert_eq!(frame.camera_id, "CAM-004");
                    saw_frame = true;
                }
                LiveMessage::Alert(_) => {}
            }
        }
    })
    .await
    .expect("expected live pushes");

    assert!(ws.is_connected());
    ws.disconnect();
    assert!(!ws.is_connected());
}

#[tokio::test]
async fn test_ws_client_gives_up_on_dead_backend() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let ws = WsClient::new(WsConfig {
        url: format!("ws://{addr}/ws"),
        max_reconnect_attempts: 2,
        reconnect_delay: Duration::from_millis(20),
    });
    let (tx, mut rx) = mpsc::unbounded_channel();
    ws.on(lifecycle::RECONNECT_FAILED, move |event| {
        let _ = tx.send(event.clone());
    });
    ws.connect();

    let event = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(event, sentri_client::ClientEvent::ReconnectFailed { attempts: 2 });
    assert_eq!(ws.reconnect_attempts(), 2);
}

// ─── Config ─────────────────────────────────────────────────────────────────

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("connector.toml");
    std::fs::write(
        &path,
        r#"
        [backend]
        base_url = "http://10.1.2.3:8000"
        auth_token = "secret"

        [polling]
        interval_ms = 5000
        event_id = "event-003"

        [telemetry]
        seed = 42
        "#,
    )
    .unwrap();

    let config = ConnectorConfig::from_file(&path).unwrap();
    assert_eq!(config.ws_url(), "ws://10.1.2.3:8000/ws");
    assert_eq!(config.api_config().auth_token.as_deref(), Some("secret"));
    assert_eq!(config.poll_interval(), Duration::from_secs(5));
    assert_eq!(config.polling.event_id, "event-003");
    assert!(config.polling.live);
    assert_eq!(config.telemetry.seed, Some(42));
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConnectorConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(format!("{err:#}").contains("absent.toml"));
}

#[test]
fn test_invalid_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[polling]\ninterval_ms = \"soon\"\n").unwrap();
    assert!(ConnectorConfig::from_file(&path).is_err());
}
