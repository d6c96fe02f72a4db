//! Deterministic fallback datasets.
//!
//! Shown only when a resource has never loaded successfully, so a view is
//! never blank. Identical input always yields identical output.

use crate::types::*;

pub fn events() -> Vec<EventSummary> {
    [
        ("event-001", "Music Festival 2025", "2025-10-20", "8 hours"),
        ("event-002", "Sports Championship", "2025-10-15", "6 hours"),
        ("event-003", "Tech Conference", "2025-10-10", "10 hours"),
    ]
    .into_iter()
    .map(|(id, name, date, duration)| EventSummary {
        id: id.to_string(),
        name: name.to_string(),
        date: Some(date.to_string()),
        duration: Some(duration.to_string()),
    })
    .collect()
}

pub fn event_report(event_id: &str) -> EventReport {
    EventReport {
        event_id: Some(event_id.to_string()),
        event_name: Some("Music Festival 2025".into()),
        date: Some("October 20, 2025".into()),
        start_time: Some("14:00".into()),
        end_time: Some("22:00".into()),
        duration: Some("8 hours".into()),
        venue: Some("Grand Arena, Hyderabad".into()),
        summary: ReportSummary {
            total_attendees: Some(15_847),
            peak_crowd: Some(12_450),
            peak_time: Some("19:30".into()),
            avg_crowd_density: Some(62.0),
            total_incidents: Some(23),
            resolved_incidents: Some(21),
            avg_response_time: Some("3.2 min".into()),
            critical_alerts: Some(5),
            medical_cases: Some(8),
            security_issues: Some(12),
            crowd_control_actions: Some(15),
        },
        crowd_timeline: [
            ("14:00", 1_250, 15.0),
            ("15:00", 3_420, 32.0),
            ("16:00", 5_680, 45.0),
            ("17:00", 7_890, 58.0),
            ("18:00", 9_340, 68.0),
            ("19:00", 11_200, 78.0),
            ("19:30", 12_450, 85.0),
            ("20:00", 11_800, 82.0),
            ("21:00", 8_900, 64.0),
            ("22:00", 3_200, 28.0),
        ]
        .into_iter()
        .map(|(time, count, density)| TimelinePoint { time: time.into(), count, density })
        .collect(),
        incidents_by_type: [
            ("Overcrowding", 5, "#ef4444"),
            ("Medical", 8, "#f97316"),
            ("Security", 7, "#eab308"),
            ("Lost Person", 3, "#3b82f6"),
        ]
        .into_iter()
        .map(|(kind, count, color)| IncidentTypeCount {
            kind: kind.into(),
            count,
            color: Some(color.into()),
        })
        .collect(),
        incidents_by_zone: [
            ("Main Stage", 8),
            ("Food Court", 5),
            ("Exit Gates", 4),
            ("Parking", 3),
            ("Restrooms", 2),
            ("VIP Area", 1),
        ]
        .into_iter()
        .map(|(zone, incidents)| ZoneIncidents { zone: zone.into(), incidents })
        .collect(),
        response_metrics: [
            ("Security Response", 2.8, 3.0, "good"),
            ("Medical Response", 3.5, 4.0, "good"),
            ("Crowd Control", 4.2, 5.0, "good"),
            ("Fire Safety", 2.1, 2.5, "excellent"),
        ]
        .into_iter()
        .map(|(metric, avg_time, target, status)| ResponseMetric {
            metric: metric.into(),
            avg_time,
            target,
            status: Some(status.into()),
        })
        .collect(),
        density_hotspots: [
            ("Main Stage - Front", 92.0, "45 min", "high"),
            ("Exit Gate B", 78.0, "30 min", "medium"),
            ("Food Court Central", 68.0, "60 min", "medium"),
            ("Restroom Area 2", 55.0, "20 min", "low"),
        ]
        .into_iter()
        .map(|(location, peak_density, duration, risk)| DensityHotspot {
            location: location.into(),
            peak_density,
            duration: Some(duration.into()),
            risk: Some(risk.into()),
        })
        .collect(),
        camera_stats: Some(CameraStats {
            total_cameras: Some(24),
            active_cameras: Some(23),
            total_recording_time: Some("192 hours".into()),
            alerts_triggered: Some(47),
            false_positives: Some(8),
            accuracy: Some(83.0),
        }),
        responder_stats: Some(ResponderStats {
            total_responders: Some(45),
            avg_tasks_per_responder: Some(8.3),
            top_performer: Some("James Wilson (SEC-001)".into()),
            total_dispatches: Some(67),
            success_rate: Some(96.0),
        }),
        recommendations: vec![
            Recommendation {
                priority: Severity::High,
                category: "Crowd Control".into(),
                issue: "Main stage area exceeded safe density limits during peak hours".into(),
                recommendation: "Deploy additional barriers and increase crowd control personnel by 30% in front-stage area".into(),
            },
            Recommendation {
                priority: Severity::Medium,
                category: "Infrastructure".into(),
                issue: "Exit Gate B showed congestion during event conclusion".into(),
                recommendation: "Open additional exit points 30 minutes before event end time".into(),
            },
            Recommendation {
                priority: Severity::Medium,
                category: "Medical".into(),
                issue: "Higher than expected medical incidents (heat exhaustion)".into(),
                recommendation: "Increase hydration stations and add cooling zones".into(),
            },
            Recommendation {
                priority: Severity::Low,
                category: "Technology".into(),
                issue: "Camera CAM-015 offline for 45 minutes".into(),
                recommendation: "Implement redundant power backup for critical camera zones".into(),
            },
        ],
        highlights: vec![
            "Zero critical injuries throughout the event".into(),
            "All emergency protocols executed successfully".into(),
            "Average response time 20% better than industry standard".into(),
            "Positive sentiment score of 78% from social media monitoring".into(),
            "Successful crowd redistribution prevented potential crush incidents".into(),
        ],
    }
}

pub fn dashboard_stats() -> DashboardStats {
    DashboardStats {
        total_attendees: 12_450,
        active_alerts: 5,
        active_cameras: 23,
        total_cameras: 24,
        available_responders: 32,
        total_responders: 45,
    }
}

/// The nine fixed camera placements, all offline until a status arrives.
pub fn cameras() -> Vec<Camera> {
    CAMERA_PLACEMENTS
        .iter()
        .map(|(id, name, location, zone)| Camera {
            id: id.to_string(),
            name: Some(name.to_string()),
            location: Some(location.to_string()),
            zone: Some(zone.to_string()),
            ..Default::default()
        })
        .collect()
}

/// (id, name, location, zone)
pub const CAMERA_PLACEMENTS: [(&str, &str, &str, &str); 9] = [
    ("CAM-001", "Main Gate A", "Entrance", "Entry"),
    ("CAM-002", "Main Stage", "Performance Area", "Stage"),
    ("CAM-003", "Food Court North", "Dining Area", "Food Court"),
    ("CAM-004", "Exit Gate B", "Exit Area", "Exit"),
    ("CAM-005", "Parking Lot C", "Parking", "Parking"),
    ("CAM-006", "VIP Section", "VIP Area", "VIP"),
    ("CAM-007", "Restroom Area", "Facilities", "Restrooms"),
    ("CAM-008", "Emergency Exit 3", "Exit Route", "Emergency"),
    ("CAM-009", "Merchandise Booth", "Shopping", "Retail"),
];
