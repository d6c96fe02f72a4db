//! Bounded random-walk primitives.

use rand::Rng;
use sentri_protocol::Trend;

/// Perturb `value` by a uniform delta in `[-spread/2, spread/2)` and clamp
/// to `[lo, hi]`. A non-finite `value` restarts from `lo`.
pub fn drift<R: Rng + ?Sized>(value: f64, spread: f64, lo: f64, hi: f64, rng: &mut R) -> f64 {
    let base = if value.is_finite() { value } else { lo };
    let delta = (rng.gen::<f64>() - 0.5) * spread;
    (base + delta).clamp(lo, hi)
}

/// Density percentage drift, always within [0, 100].
pub fn drift_density<R: Rng + ?Sized>(prev: f64, spread: f64, rng: &mut R) -> f64 {
    drift(prev, spread, 0.0, 100.0, rng)
}

/// Headcount drift, never negative.
pub fn drift_count<R: Rng + ?Sized>(prev: u64, spread: f64, rng: &mut R) -> u64 {
    let delta = ((rng.gen::<f64>() - 0.5) * spread).floor() as i64;
    let next = i64::try_from(prev).unwrap_or(i64::MAX).saturating_add(delta);
    next.max(0) as u64
}

/// Classify a change; moves within `threshold` count as stable.
pub fn trend_between(old: f64, new: f64, threshold: f64) -> Trend {
    if new > old + threshold {
        Trend::Increasing
    } else if new < old - threshold {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}
