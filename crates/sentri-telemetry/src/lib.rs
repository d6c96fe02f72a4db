//! SentriAI Telemetry - simulated crowd data and telemetry sources
//!
//! Generators perturb a previous value by a bounded random delta and clamp
//! the result, so every output stays inside its documented range. They drive
//! placeholder views only; real measurements arrive through the same
//! [`TelemetrySource`] contract via [`ChannelSource`].

pub mod cameras;
pub mod generator;
pub mod heatmap;
pub mod source;
pub mod zones;

pub use cameras::CameraTiles;
pub use generator::{drift, drift_count, drift_density, trend_between};
pub use heatmap::HeatmapGrid;
pub use source::{ChannelSource, CrowdSender, SimulatedSource, TelemetrySource};
pub use zones::{Zone, ZoneSim};
