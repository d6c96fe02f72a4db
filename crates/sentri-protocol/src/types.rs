//! Ingress records for the HTTP endpoints and WebSocket payloads.
//!
//! Backend shapes are not contractually fixed, so every record normalizes
//! once at the boundary: scalar fields that may be absent are `Option`,
//! collections default to empty, and enums fall back to an `Unknown`
//! variant instead of failing the whole payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::WS_PATH;

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// HTTP GET resources consumed by the dashboard, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Health,
    Events,
    EventReport(String),
    DashboardStats,
    RecentAlerts(u32),
    Alerts,
    Cameras,
    CameraStatus(String),
    CrowdLive,
    Heatmap,
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Self::Health => "/api/health".to_string(),
            Self::Events => "/api/events".to_string(),
            Self::EventReport(id) => format!("/api/events/{id}/report"),
            Self::DashboardStats => "/api/dashboard/stats".to_string(),
            Self::RecentAlerts(limit) => format!("/api/dashboard/alerts/recent?limit={limit}"),
            Self::Alerts => "/api/alerts".to_string(),
            Self::Cameras => "/api/cameras".to_string(),
            Self::CameraStatus(id) => format!("/api/cameras/{id}/status"),
            Self::CrowdLive => "/api/crowd/live".to_string(),
            Self::Heatmap => "/api/crowd/heatmap".to_string(),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// WebSocket URL served alongside an HTTP base URL: `http://host:port`
/// becomes `ws://host:port/ws`, `https` becomes `wss`.
pub fn derive_ws_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{base}{WS_PATH}")
}

/// Accepts either a JSON string or number as an identifier.
fn flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Id>::deserialize(deserializer)? {
        Some(Id::Str(s)) => s,
        Some(Id::Int(n)) => n.to_string(),
        Some(Id::Float(n)) => n.to_string(),
        None => String::new(),
    })
}

// ---------------------------------------------------------------------------
// Events and post-event reports
// ---------------------------------------------------------------------------

/// Entry of the event list. Entries without an id decode with an empty one
/// and are dropped by the API client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSummary {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    pub name: String,
    pub date: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventReport {
    pub event_id: Option<String>,
    pub event_name: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration: Option<String>,
    pub venue: Option<String>,
    pub summary: ReportSummary,
    pub crowd_timeline: Vec<TimelinePoint>,
    pub incidents_by_type: Vec<IncidentTypeCount>,
    pub incidents_by_zone: Vec<ZoneIncidents>,
    pub response_metrics: Vec<ResponseMetric>,
    pub density_hotspots: Vec<DensityHotspot>,
    pub camera_stats: Option<CameraStats>,
    pub responder_stats: Option<ResponderStats>,
    pub recommendations: Vec<Recommendation>,
    pub highlights: Vec<String>,
}

impl EventReport {
    /// Peak density across the crowd timeline, if any.
    pub fn peak_density(&self) -> Option<f64> {
        self.crowd_timeline
            .iter()
            .map(|p| p.density)
            .fold(None, |acc, d| Some(acc.map_or(d, |a: f64| a.max(d))))
    }

    /// Share of incidents resolved, in percent.
    pub fn resolution_rate(&self) -> Option<f64> {
        let total = self.summary.total_incidents?;
        let resolved = self.summary.resolved_incidents?;
        if total == 0 {
            return None;
        }
        Some(resolved as f64 / total as f64 * 100.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportSummary {
    pub total_attendees: Option<u64>,
    pub peak_crowd: Option<u64>,
    pub peak_time: Option<String>,
    pub avg_crowd_density: Option<f64>,
    pub total_incidents: Option<u64>,
    pub resolved_incidents: Option<u64>,
    pub avg_response_time: Option<String>,
    pub critical_alerts: Option<u64>,
    pub medical_cases: Option<u64>,
    pub security_issues: Option<u64>,
    pub crowd_control_actions: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelinePoint {
    pub time: String,
    pub count: u64,
    pub density: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentTypeCount {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: u64,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneIncidents {
    pub zone: String,
    pub incidents: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseMetric {
    pub metric: String,
    pub avg_time: f64,
    pub target: f64,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DensityHotspot {
    pub location: String,
    pub peak_density: f64,
    pub duration: Option<String>,
    pub risk: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraStats {
    pub total_cameras: Option<u64>,
    pub active_cameras: Option<u64>,
    pub total_recording_time: Option<String>,
    pub alerts_triggered: Option<u64>,
    pub false_positives: Option<u64>,
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponderStats {
    pub total_responders: Option<u64>,
    pub avg_tasks_per_responder: Option<f64>,
    pub top_performer: Option<String>,
    pub total_dispatches: Option<u64>,
    pub success_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    pub priority: Severity,
    pub category: String,
    pub issue: String,
    pub recommendation: String,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_attendees: u64,
    pub active_alerts: u64,
    pub active_cameras: u64,
    pub total_cameras: u64,
    pub available_responders: u64,
    pub total_responders: u64,
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Alert severity. Ordered so that `Critical` sorts first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    #[default]
    Low,
    #[serde(other)]
    Unknown,
}

impl Severity {
    /// Sort rank: 0 is most urgent.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
            Self::Unknown => 4,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    #[default]
    Pending,
    Acknowledged,
    InProgress,
    Resolved,
    FalseAlarm,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Alert {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(alias = "alertType")]
    pub alert_type: Option<String>,
    pub severity: Severity,
    pub status: AlertStatus,
    pub message: Option<String>,
    #[serde(alias = "location")]
    pub zone: Option<String>,
    #[serde(alias = "cameraId")]
    pub camera_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Alert as served by the HTTP endpoints, where `type` names the alert
/// kind. On the WebSocket the same key is the envelope tag, so the mapping
/// happens here rather than on [`Alert`] itself.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertRecord {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(flatten)]
    alert: Alert,
}

impl AlertRecord {
    pub fn into_alert(self) -> Alert {
        let mut alert = self.alert;
        if alert.alert_type.is_none() {
            alert.alert_type = self.kind;
        }
        alert
    }
}

// ---------------------------------------------------------------------------
// Cameras
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraState {
    Online,
    #[default]
    Offline,
    Error,
    Maintenance,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Camera {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub zone: Option<String>,
    pub status: CameraState,
    pub crowd_density: Option<f64>,
    pub people_count: Option<u64>,
    pub fps: Option<u32>,
    pub has_alert: bool,
    pub alert_type: Option<String>,
    pub detections: Vec<String>,
}

/// Payload of a `camera_status` push.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraStatusReport {
    #[serde(deserialize_with = "flexible_id")]
    pub camera_id: String,
    pub status: CameraState,
    pub fps: Option<u32>,
    pub recording: Option<bool>,
}

/// Payload of a `camera_frame` push.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraFrame {
    #[serde(deserialize_with = "flexible_id")]
    pub camera_id: String,
    /// Base64-encoded JPEG, when the backend ships pixels.
    pub frame: Option<String>,
    pub people_count: Option<u64>,
    pub detections: Vec<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Crowd telemetry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
    #[serde(other)]
    Unknown,
}

/// Payload of a `crowd_update` push, and the record produced by telemetry
/// sources (simulated or live).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrowdUpdate {
    pub zone: String,
    pub density: f64,
    pub people_count: u64,
    pub trend: Trend,
    pub timestamp: Option<DateTime<Utc>>,
}

impl CrowdUpdate {
    /// Clamp density into [0, 100]; non-finite densities become 0.
    pub fn normalized(mut self) -> Self {
        self.density = if self.density.is_finite() {
            self.density.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self
    }
}

// ---------------------------------------------------------------------------
// Health and heatmap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub status: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.as_deref() == Some("healthy")
    }
}

/// One cell of the venue heatmap grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatCell {
    pub x: usize,
    pub y: usize,
    pub density: f64,
    pub trend: Trend,
    pub people_count: u64,
}

/// Payload of the heatmap endpoint, cells in row-major order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heatmap {
    pub cells: Vec<HeatCell>,
}

// ---------------------------------------------------------------------------
// Responders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponderStatus {
    Available,
    Busy,
    OnScene,
    #[default]
    Offline,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Responder {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    pub name: Option<String>,
    pub status: ResponderStatus,
    pub location: Option<GeoPoint>,
}
