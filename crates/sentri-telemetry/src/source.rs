//! Telemetry sources.
//!
//! Simulated and live data share one contract so views never know which
//! one feeds them.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

use sentri_protocol::CrowdUpdate;

use crate::zones::ZoneSim;

pub const MIN_TICK: Duration = Duration::from_secs(2);
pub const MAX_TICK: Duration = Duration::from_secs(5);

/// A stream of crowd updates.
pub trait TelemetrySource: Send {
    /// Next update, or `None` once the source has ended.
    fn next_update<'a>(&'a mut self) -> Pin<Box<dyn Future<Output = Option<CrowdUpdate>> + Send + 'a>>;

    /// Short label for logs.
    fn name(&self) -> &'static str;
}

/// Zone simulation stepped on a fixed timer.
///
/// Each tick advances every zone once and yields one update per zone.
pub struct SimulatedSource {
    sim: ZoneSim,
    rng: StdRng,
    ticker: Interval,
    pending: VecDeque<CrowdUpdate>,
}

impl SimulatedSource {
    /// `tick` is clamped into [2 s, 5 s]. Must be called inside a Tokio runtime.
    pub fn new(tick: Duration, seed: Option<u64>) -> Self {
        Self::with_zones(ZoneSim::default(), tick, seed)
    }

    pub fn with_zones(sim: ZoneSim, tick: Duration, seed: Option<u64>) -> Self {
        let tick = tick.clamp(MIN_TICK, MAX_TICK);
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            sim,
            rng,
            ticker,
            pending: VecDeque::new(),
        }
    }

    pub fn period(&self) -> Duration {
        self.ticker.period()
    }
}

impl TelemetrySource for SimulatedSource {
    fn next_update<'a>(&'a mut self) -> Pin<Box<dyn Future<Output = Option<CrowdUpdate>> + Send + 'a>> {
        Box::pin(async move {
            while self.pending.is_empty() {
                self.ticker.tick().await;
                self.sim.step(&mut self.rng);
                self.pending.extend(self.sim.updates());
                tracing::trace!(zones = self.pending.len(), "Simulated telemetry tick");
            }
            self.pending.pop_front()
        })
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

/// Sender half feeding a [`ChannelSource`], typically from a WebSocket
/// `crowd_update` subscriber.
pub type CrowdSender = mpsc::UnboundedSender<CrowdUpdate>;

/// Live updates pushed in from elsewhere.
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<CrowdUpdate>,
}

impl ChannelSource {
    pub fn channel() -> (CrowdSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

impl TelemetrySource for ChannelSource {
    fn next_update<'a>(&'a mut self) -> Pin<Box<dyn Future<Output = Option<CrowdUpdate>> + Send + 'a>> {
        Box::pin(async move { self.rx.recv().await.map(CrowdUpdate::normalized) })
    }

    fn name(&self) -> &'static str {
        "live"
    }
}
