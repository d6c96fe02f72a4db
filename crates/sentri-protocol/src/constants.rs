//! Protocol-wide constants.

/// Automatic reconnects allowed after consecutive closes before giving up.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
/// Fixed delay between a close and the next reconnect attempt.
pub const RECONNECT_DELAY_MS: u64 = 3_000;

/// Default report polling interval.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;
/// Per-request HTTP timeout.
pub const HTTP_TIMEOUT_SECS: u64 = 10;

pub const REFRESH_ALERTS_MS: u64 = 5_000;
pub const REFRESH_CAMERAS_MS: u64 = 10_000;
pub const REFRESH_HEATMAP_MS: u64 = 15_000;
pub const REFRESH_ANALYTICS_MS: u64 = 30_000;

/// Single backend for both HTTP and WebSocket traffic.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
/// Path of the live WebSocket endpoint relative to the base URL.
pub const WS_PATH: &str = "/ws";

/// Default number of alerts requested from the recent-alerts endpoint.
pub const DEFAULT_RECENT_ALERTS: u32 = 5;
