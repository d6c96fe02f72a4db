//! Live monitor: polls an event report, follows the WebSocket channel and
//! logs crowd telemetry until interrupted.

use std::sync::Arc;

use sentri_client::{ApiClient, ClientEvent, HttpFetcher, PollSnapshot, Poller, WsClient};
use sentri_protocol::{
    fallback, lifecycle, DensityLevel, Endpoint, EventReport, LiveMessage, Topic,
};
use sentri_telemetry::{ChannelSource, SimulatedSource, TelemetrySource};

use crate::config::ConnectorConfig;

#[derive(Debug, Clone, Default)]
pub struct MonitorOptions {
    /// Overrides `polling.event_id`.
    pub event_id: Option<String>,
    /// Cameras to subscribe to on every connect.
    pub cameras: Vec<String>,
    /// Refresh the report once instead of polling.
    pub no_live: bool,
    /// Use simulated telemetry instead of `crowd_update` pushes.
    pub simulate: bool,
}

fn report_fallback(endpoint: &Endpoint) -> EventReport {
    match endpoint {
        Endpoint::EventReport(id) => fallback::event_report(id),
        _ => fallback::event_report("event-001"),
    }
}

/// Build a report poller for `event_id`. Live pollers start immediately;
/// otherwise a single refresh is issued.
pub fn report_poller(api: &ApiClient, config: &ConnectorConfig, event_id: &str, live: bool) -> Poller<EventReport> {
    let poller = Poller::new(
        HttpFetcher::<EventReport>::new(api.clone()),
        report_fallback,
        config.poll_interval(),
    );
    let endpoint = Endpoint::EventReport(event_id.to_string());
    if live {
        poller.start(endpoint);
    } else {
        poller.set_endpoint(endpoint);
    }
    poller
}

/// Register the monitor's WebSocket subscribers.
pub fn wire_live_channel(ws: &WsClient, cameras: Vec<String>) {
    let weak = ws.downgrade();
    let cameras = Arc::new(cameras);
    ws.on(lifecycle::CONNECTED, move |_| {
        let Some(handle) = weak.upgrade() else {
            return;
        };
        if let Err(e) = handle.subscribe_to_alerts() {
            tracing::warn!(error = %e, "Failed to subscribe to alerts");
        }
        for camera_id in cameras.iter() {
            if let Err(e) = handle.subscribe_to_camera(camera_id) {
                tracing::warn!(camera = %camera_id, error = %e, "Failed to subscribe to camera");
            }
        }
    });

    ws.on(Topic::Alert.as_str(), |event| {
        if let Some(LiveMessage::Alert(alert)) = event.live() {
            tracing::warn!(
                id = %alert.id,
                severity = %alert.severity,
                zone = alert.zone.as_deref().unwrap_or("-"),
                message = alert.message.as_deref().unwrap_or(""),
                "Alert"
            );
        }
    });

    ws.on(Topic::CameraStatus.as_str(), |event| {
        if let Some(LiveMessage::CameraStatus(status)) = event.live() {
            tracing::info!(camera = %status.camera_id, status = ?status.status, "Camera status");
        }
    });

    ws.on(Topic::CameraFrame.as_str(), |event| {
        if let Some(LiveMessage::CameraFrame(frame)) = event.live() {
            tracing::debug!(camera = %frame.camera_id, people = frame.people_count.unwrap_or(0), "Camera frame");
        }
    });

    ws.on(lifecycle::DISCONNECTED, |_| tracing::info!("Live channel disconnected"));
    ws.on(lifecycle::RECONNECT_FAILED, |event| {
        if let ClientEvent::ReconnectFailed { attempts } = event {
            tracing::error!(attempts, "Live channel offline");
        }
    });
}

fn log_snapshot(snapshot: &PollSnapshot<EventReport>) {
    if snapshot.loading {
        return;
    }
    let Some(report) = &snapshot.data else {
        return;
    };
    tracing::info!(
        event = report.event_name.as_deref().unwrap_or("-"),
        attendees = report.summary.total_attendees.unwrap_or(0),
        peak_density = report.peak_density().unwrap_or(0.0),
        fallback = snapshot.is_fallback,
        error = snapshot.error.as_deref().unwrap_or(""),
        cycle = snapshot.cycle,
        "Event report"
    );
}

/// Run until Ctrl-C.
pub async fn run(config: &ConnectorConfig, options: MonitorOptions) -> anyhow::Result<()> {
    let api = ApiClient::new(config.api_config())?;
    match api.health().await {
        Ok(_) => tracing::info!(url = %api.base_url(), "Backend reachable"),
        Err(e) => tracing::warn!(url = %api.base_url(), error = %e, "Backend unreachable, showing fallback data"),
    }

    let event_id = options.event_id.unwrap_or_else(|| config.polling.event_id.clone());
    let live = config.polling.live && !options.no_live;
    let poller = report_poller(&api, config, &event_id, live);
    let mut reports = poller.subscribe();

    let ws = WsClient::new(config.ws_config());
    wire_live_channel(&ws, options.cameras);

    let mut telemetry: Box<dyn TelemetrySource> = if options.simulate {
        Box::new(SimulatedSource::new(config.telemetry_tick(), config.telemetry.seed))
    } else {
        let (tx, source) = ChannelSource::channel();
        ws.on(Topic::CrowdUpdate.as_str(), move |event| {
            if let Some(LiveMessage::CrowdUpdate(update)) = event.live() {
                let _ = tx.send(update);
            }
        });
        Box::new(source)
    };
    let source_name = telemetry.name();
    tracing::info!(event = %event_id, live, telemetry = source_name, ws = %ws.url(), "Monitor started");

    ws.connect();

    let mut telemetry_open = true;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down monitor");
                break;
            }
            changed = reports.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = reports.borrow_and_update().clone();
                log_snapshot(&snapshot);
            }
            update = telemetry.next_update(), if telemetry_open => match update {
                Some(update) => {
                    let level = DensityLevel::from_percent(update.density);
                    tracing::info!(
                        zone = %update.zone,
                        density = update.density,
                        people = update.people_count,
                        level = %level,
                        "Crowd update"
                    );
                }
                None => {
                    tracing::info!(source = source_name, "Telemetry source ended");
                    telemetry_open = false;
                }
            },
        }
    }

    poller.stop();
    ws.disconnect();
    Ok(())
}
