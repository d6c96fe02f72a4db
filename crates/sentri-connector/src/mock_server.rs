//! Stand-in backend serving simulated data over the same HTTP endpoints and
//! WebSocket envelope the dashboard consumes.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use uuid::Uuid;

use sentri_protocol::{
    fallback, sort_alerts_by_priority, Alert, AlertStatus, Camera, CameraFrame, CameraState,
    CameraStatusReport, DensityLevel, HealthStatus, OutboundCommand, Severity, Topic, DEFAULT_RECENT_ALERTS,
};
use sentri_telemetry::{CameraTiles, HeatmapGrid, ZoneSim};

#[derive(Debug, Clone)]
pub struct MockOptions {
    /// Period of simulation steps and WebSocket pushes.
    pub push_interval: Duration,
    pub seed: Option<u64>,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            push_interval: Duration::from_secs(2),
            seed: None,
        }
    }
}

struct World {
    rng: StdRng,
    zones: ZoneSim,
    tiles: CameraTiles,
    heatmap: HeatmapGrid,
}

impl World {
    fn new(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let tiles = CameraTiles::generate(&mut rng);
        let heatmap = HeatmapGrid::generate(&mut rng);
        Self {
            rng,
            zones: ZoneSim::default(),
            tiles,
            heatmap,
        }
    }

    fn step(&mut self) {
        self.zones.step(&mut self.rng);
        self.tiles.step(&mut self.rng);
        self.heatmap.step(&mut self.rng);
    }

    fn alerts(&self) -> Vec<Alert> {
        self.tiles
            .alerting()
            .map(|cam| camera_alert(cam, format!("ALT-{}", cam.id)))
            .collect()
    }
}

fn severity_for(density: f64) -> Severity {
    match DensityLevel::from_percent(density) {
        DensityLevel::Critical => Severity::Critical,
        DensityLevel::High => Severity::High,
        DensityLevel::Moderate => Severity::Medium,
        DensityLevel::Low => Severity::Low,
    }
}

fn camera_alert(cam: &Camera, id: String) -> Alert {
    let density = cam.crowd_density.unwrap_or_default();
    let place = cam.name.as_deref().unwrap_or(&cam.id);
    Alert {
        id,
        alert_type: Some(cam.alert_type.clone().unwrap_or_else(|| "overcrowding".into())),
        severity: severity_for(density),
        status: AlertStatus::Pending,
        message: Some(format!("Crowd density at {density:.0}% near {place}")),
        zone: cam.zone.clone(),
        camera_id: Some(cam.id.clone()),
        timestamp: Some(Utc::now()),
    }
}

#[derive(Clone)]
struct MockState {
    world: Arc<RwLock<World>>,
    push_interval: Duration,
}

pub struct MockBackend {
    state: MockState,
}

impl MockBackend {
    pub fn new(options: MockOptions) -> Self {
        Self {
            state: MockState {
                world: Arc::new(RwLock::new(World::new(options.seed))),
                push_interval: options.push_interval,
            },
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/health", get(api_health))
            .route("/api/events", get(api_events))
            .route("/api/events/:event_id/report", get(api_event_report))
            .route("/api/dashboard/stats", get(api_dashboard_stats))
            .route("/api/dashboard/alerts/recent", get(api_recent_alerts))
            .route("/api/alerts", get(api_alerts))
            .route("/api/cameras", get(api_cameras))
            .route("/api/cameras/:camera_id/status", get(api_camera_status))
            .route("/api/crowd/live", get(api_crowd_live))
            .route("/api/crowd/heatmap", get(api_heatmap))
            .route("/ws", get(ws_upgrade))
            .with_state(self.state.clone())
    }

    /// Bind `bind_addr` and serve until the process ends.
    pub async fn run(self, bind_addr: &str) -> anyhow::Result<()> {
        let listener = TcpListener::bind(bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let addr: SocketAddr = listener.local_addr()?;
        let app = self.router();

        let world = Arc::clone(&self.state.world);
        let period = self.state.push_interval;
        let simulation = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                world.write().await.step();
            }
        });

        tracing::info!(addr = %addr, push_ms = period.as_millis() as u64, "Mock backend listening");
        let result = axum::serve(listener, app).await;
        simulation.abort();
        Ok(result?)
    }
}

// ── HTTP handlers ───────────────────────────────────────────────────────────

async fn api_health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: Some("healthy".into()),
        timestamp: Some(Utc::now()),
    })
}

async fn api_events() -> impl IntoResponse {
    Json(fallback::events())
}

fn not_found(detail: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": detail })))
}

async fn api_event_report(Path(event_id): Path<String>) -> impl IntoResponse {
    if fallback::events().iter().any(|e| e.id == event_id) {
        Ok(Json(fallback::event_report(&event_id)))
    } else {
        Err(not_found("Event not found"))
    }
}

async fn api_dashboard_stats(State(s): State<MockState>) -> impl IntoResponse {
    let world = s.world.read().await;
    let cameras = world.tiles.cameras();
    let mut stats = fallback::dashboard_stats();
    stats.total_cameras = cameras.len() as u64;
    stats.active_cameras = cameras.iter().filter(|c| c.status == CameraState::Online).count() as u64;
    stats.active_alerts = world.tiles.alerting().count() as u64;
    stats.total_attendees = world.zones.zones().iter().map(|z| z.people_count).sum();
    Json(stats)
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    limit: Option<usize>,
}

/// HTTP alert shape: the kind travels as `type` and the zone as `location`.
fn http_alert(alert: &Alert) -> Value {
    let mut value = serde_json::to_value(alert).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        if let Some(kind) = map.remove("alert_type") {
            map.insert("type".into(), kind);
        }
        if let Some(zone) = map.remove("zone") {
            map.insert("location".into(), zone);
        }
    }
    value
}

async fn api_recent_alerts(State(s): State<MockState>, Query(q): Query<RecentQuery>) -> impl IntoResponse {
    let alerts = s.world.read().await.alerts();
    let limit = q.limit.unwrap_or(DEFAULT_RECENT_ALERTS as usize);
    Json(
        sort_alerts_by_priority(&alerts)
            .iter()
            .take(limit)
            .map(http_alert)
            .collect::<Vec<_>>(),
    )
}

async fn api_alerts(State(s): State<MockState>) -> impl IntoResponse {
    Json(s.world.read().await.alerts().iter().map(http_alert).collect::<Vec<_>>())
}

async fn api_cameras(State(s): State<MockState>) -> impl IntoResponse {
    Json(s.world.read().await.tiles.cameras().to_vec())
}

fn camera_status(cam: &Camera) -> CameraStatusReport {
    CameraStatusReport {
        camera_id: cam.id.clone(),
        status: cam.status,
        fps: cam.fps,
        recording: Some(cam.status == CameraState::Online),
    }
}

async fn api_camera_status(State(s): State<MockState>, Path(camera_id): Path<String>) -> impl IntoResponse {
    let world = s.world.read().await;
    match world.tiles.cameras().iter().find(|c| c.id == camera_id) {
        Some(cam) => Ok(Json(camera_status(cam))),
        None => Err(not_found("Camera not found")),
    }
}

async fn api_crowd_live(State(s): State<MockState>) -> impl IntoResponse {
    Json(s.world.read().await.zones.updates())
}

async fn api_heatmap(State(s): State<MockState>) -> impl IntoResponse {
    Json(s.world.read().await.heatmap.snapshot())
}

// ── WebSocket ───────────────────────────────────────────────────────────────

/// Serialize `record` and tag it with `type`.
fn envelope<T: Serialize>(kind: &str, record: &T) -> serde_json::Result<String> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(map) = &mut value {
        map.insert("type".into(), Value::String(kind.to_string()));
    }
    Ok(value.to_string())
}

#[derive(Default)]
struct Session {
    alerts: bool,
    cameras: HashSet<String>,
}

impl Session {
    /// Apply a client command and return the immediate replies.
    fn handle(&mut self, command: OutboundCommand, world: &World) -> serde_json::Result<Vec<String>> {
        let mut replies = Vec::new();
        match command {
            OutboundCommand::SubscribeCamera { camera_id } => {
                if let Some(cam) = world.tiles.cameras().iter().find(|c| c.id == camera_id) {
                    replies.push(envelope(Topic::CameraStatus.as_str(), &camera_status(cam))?);
                }
                self.cameras.insert(camera_id);
            }
            OutboundCommand::UnsubscribeCamera { camera_id } => {
                self.cameras.remove(&camera_id);
            }
            OutboundCommand::SubscribeAlerts => {
                self.alerts = true;
                for alert in world.alerts() {
                    replies.push(envelope(Topic::Alert.as_str(), &alert)?);
                }
            }
        }
        Ok(replies)
    }

    /// Frames pushed on every tick.
    fn tick(&self, world: &World) -> serde_json::Result<Vec<String>> {
        let mut frames = Vec::new();
        for update in world.zones.updates() {
            if self.alerts && DensityLevel::from_percent(update.density) >= DensityLevel::High {
                let alert = Alert {
                    id: format!("ALT-{}", Uuid::new_v4().simple()),
                    alert_type: Some("overcrowding".into()),
                    severity: severity_for(update.density),
                    status: AlertStatus::Pending,
                    message: Some(format!("Crowd density at {:.0}% in {}", update.density, update.zone)),
                    zone: Some(update.zone.clone()),
                    camera_id: None,
                    timestamp: update.timestamp,
                };
                frames.push(envelope(Topic::Alert.as_str(), &alert)?);
            }
            frames.push(envelope(Topic::CrowdUpdate.as_str(), &update)?);
        }
        for cam in world.tiles.cameras().iter().filter(|c| self.cameras.contains(&c.id)) {
            let frame = CameraFrame {
                camera_id: cam.id.clone(),
                frame: None,
                people_count: cam.people_count,
                detections: cam.detections.clone(),
                timestamp: Some(Utc::now()),
            };
            frames.push(envelope(Topic::CameraFrame.as_str(), &frame)?);
        }
        Ok(frames)
    }
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(s): State<MockState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_session(socket, s))
}

async fn ws_session(socket: WebSocket, state: MockState) {
    let (mut sender, mut receiver) = socket.split();
    let mut session = Session::default();
    let mut ticker = tokio::time::interval(state.push_interval);
    tracing::info!("Mock WebSocket client connected");

    loop {
        let frames = tokio::select! {
            _ = ticker.tick() => session.tick(&*state.world.read().await),
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<OutboundCommand>(&text) {
                    Ok(command) => {
                        tracing::debug!(command = command.kind(), "Mock backend received command");
                        session.handle(command, &*state.world.read().await)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Mock backend ignoring unknown command");
                        continue;
                    }
                },
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => continue,
            },
        };

        let frames = match frames {
            Ok(frames) => frames,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode mock frame");
                continue;
            }
        };
        for frame in frames {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                tracing::info!("Mock WebSocket client went away");
                return;
            }
        }
    }
    tracing::info!("Mock WebSocket client disconnected");
}
