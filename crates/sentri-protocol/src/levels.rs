//! Density, risk and priority classification shared by every view.

use crate::types::{Alert, GeoPoint, Responder, ResponderStatus};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Crowd density band for a percentage in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DensityLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl DensityLevel {
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 100.0 {
            Self::Critical
        } else if percent >= 85.0 {
            Self::High
        } else if percent >= 60.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Low => "#4ade80",
            Self::Moderate => "#fbbf24",
            Self::High => "#fb923c",
            Self::Critical => "#ef4444",
        }
    }
}

impl std::fmt::Display for DensityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Combined risk score, capped at 100.
pub fn risk_score(crowd_density: f64, anomalies: u32, panic_level: f64) -> f64 {
    let score = crowd_density * 0.5 + anomalies as f64 * 10.0 + panic_level * 0.3;
    score.min(100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Self::Critical,
            s if s >= 75.0 => Self::High,
            s if s >= 50.0 => Self::Medium,
            s if s >= 30.0 => Self::Low,
            _ => Self::Safe,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Safe => "safe",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Critical first; within a severity, newest first. Alerts without a
/// timestamp sort after timestamped ones.
pub fn sort_alerts_by_priority(alerts: &[Alert]) -> Vec<Alert> {
    let mut sorted = alerts.to_vec();
    sorted.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
    sorted
}

/// Great-circle distance in kilometres (haversine).
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Closest available responder with a known location, and its distance.
pub fn nearest_available_responder<'a>(
    target: GeoPoint,
    responders: &'a [Responder],
) -> Option<(&'a Responder, f64)> {
    responders
        .iter()
        .filter(|r| r.status == ResponderStatus::Available)
        .filter_map(|r| r.location.map(|loc| (r, distance_km(target, loc))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Compact count formatting: 1500 -> "1.5K".
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}
