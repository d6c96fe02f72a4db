//! Simulated camera tiles for the video wall.

use rand::Rng;

use sentri_protocol::{fallback, Camera, CameraState};

use crate::generator::{drift_count, drift_density};

const DENSITY_SPREAD: f64 = 5.0;
const COUNT_SPREAD: f64 = 20.0;
pub const HIGH_DENSITY_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone)]
pub struct CameraTiles {
    cameras: Vec<Camera>,
}

impl CameraTiles {
    /// Random initial readings over the fixed placements; the main stage and
    /// exit cameras always start with an active alert.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cameras: Vec<Camera> = fallback::cameras()
            .into_iter()
            .map(|cam| Camera {
                status: if rng.gen_bool(0.9) { CameraState::Online } else { CameraState::Offline },
                has_alert: rng.gen_bool(0.3),
                crowd_density: Some(rng.gen_range(0..100) as f64),
                people_count: Some(rng.gen_range(0..500)),
                fps: Some(rng.gen_range(25..30)),
                ..cam
            })
            .collect();

        if let Some(stage) = cameras.get_mut(1) {
            stage.has_alert = true;
            stage.alert_type = Some("overcrowding".into());
            stage.crowd_density = Some(92.0);
            stage.people_count = Some(580);
            stage.detections = vec!["High Crowd Density".into(), "Unusual Movement".into()];
        }
        if let Some(exit) = cameras.get_mut(3) {
            exit.has_alert = true;
            exit.alert_type = Some("unusual_activity".into());
            exit.crowd_density = Some(45.0);
            exit.detections = vec!["Suspicious Behavior Detected".into()];
        }

        Self { cameras }
    }

    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for cam in &mut self.cameras {
            cam.crowd_density = Some(drift_density(cam.crowd_density.unwrap_or(0.0), DENSITY_SPREAD, rng));
            cam.people_count = Some(drift_count(cam.people_count.unwrap_or(0), COUNT_SPREAD, rng));
        }
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn alerting(&self) -> impl Iterator<Item = &Camera> {
        self.cameras.iter().filter(|c| c.has_alert)
    }

    pub fn high_density(&self) -> impl Iterator<Item = &Camera> {
        self.cameras
            .iter()
            .filter(|c| c.crowd_density.unwrap_or(0.0) > HIGH_DENSITY_THRESHOLD)
    }
}
