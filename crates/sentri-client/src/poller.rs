//! Periodic fetcher that keeps a view's data fresh without overlapping
//! requests.
//!
//! Every fetch belongs to a numbered cycle. Beginning a cycle aborts the
//! previous in-flight request, and a completed fetch is applied only while
//! its cycle is still current, so the last cycle wins regardless of network
//! arrival order. Failures keep the previously loaded data; when nothing
//! has ever loaded, the endpoint's fallback dataset is shown instead.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use sentri_protocol::Endpoint;

use crate::{FetchError, Fetcher};

/// Shortest accepted polling interval.
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// What a view renders.
#[derive(Debug, Clone)]
pub struct PollSnapshot<T> {
    pub data: Option<T>,
    /// Endpoint the current `data` was loaded (or substituted) for.
    pub source: Option<Endpoint>,
    pub last_fetched: Option<DateTime<Utc>>,
    /// Non-fatal error annotation from the latest completed cycle.
    pub error: Option<String>,
    pub loading: bool,
    pub is_fallback: bool,
    /// Latest cycle begun.
    pub cycle: u64,
}

impl<T> Default for PollSnapshot<T> {
    fn default() -> Self {
        Self {
            data: None,
            source: None,
            last_fetched: None,
            error: None,
            loading: false,
            is_fallback: false,
            cycle: 0,
        }
    }
}

struct Inner {
    endpoint: Option<Endpoint>,
    interval: Duration,
    live: bool,
    cycle: u64,
    in_flight: Option<JoinHandle<()>>,
    /// Bumped whenever the timer is stopped or replaced.
    timer_epoch: u64,
    timer: Option<JoinHandle<()>>,
}

struct Shared<T> {
    fetcher: Arc<dyn Fetcher<T>>,
    fallback: Box<dyn Fn(&Endpoint) -> T + Send + Sync>,
    inner: Mutex<Inner>,
    state: watch::Sender<PollSnapshot<T>>,
}

impl<T> Shared<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Begin a cycle for the current endpoint. `timer_epoch` is `Some` when
    /// called from a timer tick, which is ignored once that timer is stale.
    fn begin_cycle(self: &Arc<Self>, timer_epoch: Option<u64>) {
        let mut inner = self.lock();
        if timer_epoch.is_some_and(|epoch| epoch != inner.timer_epoch) {
            return;
        }
        let Some(endpoint) = inner.endpoint.clone() else {
            return;
        };

        if let Some(previous) = inner.in_flight.take() {
            previous.abort();
        }
        inner.cycle += 1;
        let cycle = inner.cycle;
        self.state.send_modify(|s| {
            s.loading = true;
            s.cycle = cycle;
        });

        tracing::debug!(endpoint = %endpoint, cycle, "Poll cycle started");
        let shared = Arc::clone(self);
        inner.in_flight = Some(tokio::spawn(async move {
            let result = shared.fetcher.fetch(&endpoint).await;
            shared.apply(cycle, &endpoint, result);
        }));
    }

    fn apply(&self, cycle: u64, endpoint: &Endpoint, result: Result<T, FetchError>) {
        let mut inner = self.lock();
        if inner.cycle != cycle {
            tracing::debug!(endpoint = %endpoint, cycle, current = inner.cycle, "Discarding superseded poll result");
            return;
        }
        inner.in_flight = None;

        match result {
            Ok(data) => {
                self.state.send_modify(|s| {
                    s.data = Some(data);
                    s.source = Some(endpoint.clone());
                    s.last_fetched = Some(Utc::now());
                    s.error = None;
                    s.loading = false;
                    s.is_fallback = false;
                });
            }
            Err(e) => {
                tracing::warn!(endpoint = %endpoint, cycle, error = %e, "Poll fetch failed");
                self.state.send_modify(|s| {
                    s.error = Some(e.to_string());
                    s.loading = false;
                    if s.data.is_none() {
                        s.data = Some((self.fallback)(endpoint));
                        s.source = Some(endpoint.clone());
                        s.last_fetched = Some(Utc::now());
                        s.is_fallback = true;
                    }
                });
            }
        }
    }

    fn restart_timer(self: &Arc<Self>, inner: &mut Inner) {
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        inner.timer_epoch += 1;
        let epoch = inner.timer_epoch;
        let period = inner.interval;
        let shared = Arc::clone(self);
        inner.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                shared.begin_cycle(Some(epoch));
            }
        }));
    }

    /// Cancel the timer and any in-flight request. Results still on the wire
    /// are discarded because the cycle moves on.
    fn halt(&self, inner: &mut Inner) {
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        inner.timer_epoch += 1;
        if let Some(request) = inner.in_flight.take() {
            request.abort();
        }
        inner.cycle += 1;
        self.state.send_if_modified(|s| std::mem::replace(&mut s.loading, false));
    }
}

/// Periodic fetcher for one logical resource at a time.
///
/// Dropping the poller stops it.
pub struct Poller<T>
where
    T: Clone + Send + Sync + 'static,
{
    shared: Arc<Shared<T>>,
}

impl<T> Poller<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an idle poller. `fallback` produces the dataset shown when an
    /// endpoint fails before anything has loaded; it must be deterministic.
    pub fn new<F, B>(fetcher: F, fallback: B, interval: Duration) -> Self
    where
        F: Fetcher<T>,
        B: Fn(&Endpoint) -> T + Send + Sync + 'static,
    {
        let (state, _) = watch::channel(PollSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                fetcher: Arc::new(fetcher),
                fallback: Box::new(fallback),
                inner: Mutex::new(Inner {
                    endpoint: None,
                    interval: interval.max(MIN_INTERVAL),
                    live: false,
                    cycle: 0,
                    in_flight: None,
                    timer_epoch: 0,
                    timer: None,
                }),
                state,
            }),
        }
    }

    /// Fetch `endpoint` immediately, then every interval.
    pub fn start(&self, endpoint: Endpoint) {
        let mut inner = self.shared.lock();
        tracing::info!(endpoint = %endpoint, interval_ms = inner.interval.as_millis() as u64, "Polling started");
        inner.endpoint = Some(endpoint);
        inner.live = true;
        self.shared.restart_timer(&mut inner);
    }

    /// Switch resources. Any pending request is cancelled and a new cycle
    /// begins at once; the timer restarts when live.
    pub fn set_endpoint(&self, endpoint: Endpoint) {
        let mut inner = self.shared.lock();
        if inner.endpoint.as_ref() == Some(&endpoint) {
            return;
        }
        tracing::debug!(endpoint = %endpoint, "Poll endpoint changed");
        inner.endpoint = Some(endpoint);
        if inner.live {
            self.shared.restart_timer(&mut inner);
        } else {
            drop(inner);
            self.shared.begin_cycle(None);
        }
    }

    /// Change the period; a running timer restarts with it.
    pub fn set_interval(&self, interval: Duration) {
        let mut inner = self.shared.lock();
        let interval = interval.max(MIN_INTERVAL);
        if inner.interval == interval {
            return;
        }
        inner.interval = interval;
        if inner.live && inner.timer.is_some() {
            self.shared.restart_timer(&mut inner);
        }
    }

    /// Toggle live updates. Already loaded data is kept either way.
    pub fn set_live(&self, live: bool) {
        let mut inner = self.shared.lock();
        if inner.live == live {
            return;
        }
        inner.live = live;
        if live {
            if inner.endpoint.is_some() {
                self.shared.restart_timer(&mut inner);
            }
        } else {
            self.shared.halt(&mut inner);
        }
        tracing::info!(live, "Live updates toggled");
    }

    /// Run a single cycle now without touching the timer.
    pub fn refresh(&self) {
        self.shared.begin_cycle(None);
    }

    /// Cancel the timer and any in-flight request. Idempotent.
    pub fn stop(&self) {
        let mut inner = self.shared.lock();
        inner.live = false;
        self.shared.halt(&mut inner);
    }

    pub fn is_live(&self) -> bool {
        self.shared.lock().live
    }

    pub fn endpoint(&self) -> Option<Endpoint> {
        self.shared.lock().endpoint.clone()
    }

    pub fn interval(&self) -> Duration {
        self.shared.lock().interval
    }

    pub fn snapshot(&self) -> PollSnapshot<T> {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified on every applied change.
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot<T>> {
        self.shared.state.subscribe()
    }
}

impl<T> Drop for Poller<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        self.shared.halt(&mut inner);
    }
}
