//! Connector configuration.
//!
//! Read from a TOML file (`--config`, else `<config dir>/sentri/connector.toml`),
//! falling back to defaults. `SENTRI_API_URL` and `SENTRI_WS_URL` override the
//! backend addresses.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use sentri_client::{ApiConfig, WsConfig};
use sentri_protocol::{
    derive_ws_url, DEFAULT_API_BASE_URL, DEFAULT_POLL_INTERVAL_MS, HTTP_TIMEOUT_SECS,
    MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY_MS,
};

pub const ENV_API_URL: &str = "SENTRI_API_URL";
pub const ENV_WS_URL: &str = "SENTRI_WS_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    pub backend: BackendConfig,
    pub polling: PollingConfig,
    pub reconnect: ReconnectConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Derived from `base_url` when unset.
    pub ws_url: Option<String>,
    pub auth_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            ws_url: None,
            auth_token: None,
            timeout_secs: HTTP_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub live: bool,
    pub event_id: String,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            live: true,
            event_id: "event-001".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RECONNECT_ATTEMPTS,
            delay_ms: RECONNECT_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub tick_ms: u64,
    /// Fixed RNG seed for reproducible simulations.
    pub seed: Option<u64>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tick_ms: 3_000,
            seed: None,
        }
    }
}

impl ConnectorConfig {
    /// `<config dir>/sentri/connector.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sentri").join("connector.toml"))
    }

    /// Load from `path`, or from the default location if it exists, then apply
    /// environment overrides. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded connector config");
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply address overrides from a variable lookup (the process
    /// environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.backend.base_url = url;
        }
        if let Some(url) = lookup(ENV_WS_URL).filter(|v| !v.is_empty()) {
            self.backend.ws_url = Some(url);
        }
    }

    /// Configured WebSocket URL, or the one derived from the HTTP base URL.
    pub fn ws_url(&self) -> String {
        match &self.backend.ws_url {
            Some(url) => url.clone(),
            None => derive_ws_url(&self.backend.base_url),
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.backend.base_url.clone(),
            auth_token: self.backend.auth_token.clone(),
            timeout: Duration::from_secs(self.backend.timeout_secs),
        }
    }

    pub fn ws_config(&self) -> WsConfig {
        WsConfig {
            url: self.ws_url(),
            max_reconnect_attempts: self.reconnect.max_attempts,
            reconnect_delay: Duration::from_millis(self.reconnect.delay_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.polling.interval_ms)
    }

    pub fn telemetry_tick(&self) -> Duration {
        Duration::from_millis(self.telemetry.tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectorConfig::default();
        assert_eq!(config.ws_url(), "ws://localhost:8000/ws");
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.ws_config().max_reconnect_attempts, 5);
        assert_eq!(config.ws_config().reconnect_delay, Duration::from_millis(3_000));
        assert!(config.polling.live);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ConnectorConfig::from_toml_str(
            r#"
            [backend]
            base_url = "https://sentri.example"

            [reconnect]
            max_attempts = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.ws_url(), "wss://sentri.example/ws");
        assert_eq!(config.reconnect.max_attempts, 2);
        assert_eq!(config.reconnect.delay_ms, RECONNECT_DELAY_MS);
        assert_eq!(config.polling, PollingConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ConnectorConfig::default();
        config.apply_overrides(|key| match key {
            ENV_API_URL => Some("http://backend:9000".into()),
            ENV_WS_URL => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.backend.base_url, "http://backend:9000");
        assert_eq!(config.ws_url(), "ws://backend:9000/ws", "empty override is ignored");

        config.apply_overrides(|key| (key == ENV_WS_URL).then(|| "ws://live:7000/stream".to_string()));
        assert_eq!(config.ws_url(), "ws://live:7000/stream");
    }
}
