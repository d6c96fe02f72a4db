//! Typed HTTP access to the backend.
//!
//! Every endpoint is a JSON GET relative to one configured base URL.
//! Response shapes are normalized by the ingress records in
//! `sentri_protocol::types`.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use sentri_protocol::{
    Alert, AlertRecord, Camera, CameraStatusReport, CrowdUpdate, DashboardStats, Endpoint,
    EventReport, EventSummary, HealthStatus, Heatmap, DEFAULT_API_BASE_URL, HTTP_TIMEOUT_SECS,
};

use crate::FetchError;

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Scheme, host and port, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Sent as a bearer token when present.
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_token: None,
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// GET an endpoint and decode its JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T, FetchError> {
        let url = self.url_for(endpoint);
        let mut request = self.http.get(&url);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::UNAUTHORIZED {
                tracing::warn!(url = %url, "Backend rejected credentials");
            } else {
                tracing::debug!(url = %url, status = status.as_u16(), "Backend returned error status");
            }
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    pub async fn health(&self) -> Result<HealthStatus, FetchError> {
        self.get_json(&Endpoint::Health).await
    }

    /// Event list. Entries without an id cannot be addressed and are skipped.
    pub async fn events(&self) -> Result<Vec<EventSummary>, FetchError> {
        let events: Vec<EventSummary> = self.get_json(&Endpoint::Events).await?;
        Ok(drop_unaddressable(events))
    }

    pub async fn event_report(&self, event_id: &str) -> Result<EventReport, FetchError> {
        self.get_json(&Endpoint::EventReport(event_id.to_string())).await
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, FetchError> {
        self.get_json(&Endpoint::DashboardStats).await
    }

    pub async fn recent_alerts(&self, limit: u32) -> Result<Vec<Alert>, FetchError> {
        self.get_alerts(&Endpoint::RecentAlerts(limit)).await
    }

    pub async fn alerts(&self) -> Result<Vec<Alert>, FetchError> {
        self.get_alerts(&Endpoint::Alerts).await
    }

    async fn get_alerts(&self, endpoint: &Endpoint) -> Result<Vec<Alert>, FetchError> {
        let records: Vec<AlertRecord> = self.get_json(endpoint).await?;
        Ok(records.into_iter().map(AlertRecord::into_alert).collect())
    }

    pub async fn cameras(&self) -> Result<Vec<Camera>, FetchError> {
        self.get_json(&Endpoint::Cameras).await
    }

    pub async fn camera_status(&self, camera_id: &str) -> Result<CameraStatusReport, FetchError> {
        self.get_json(&Endpoint::CameraStatus(camera_id.to_string())).await
    }

    pub async fn crowd_live(&self) -> Result<Vec<CrowdUpdate>, FetchError> {
        let updates: Vec<CrowdUpdate> = self.get_json(&Endpoint::CrowdLive).await?;
        Ok(updates.into_iter().map(CrowdUpdate::normalized).collect())
    }

    pub async fn heatmap(&self) -> Result<Heatmap, FetchError> {
        self.get_json(&Endpoint::Heatmap).await
    }
}

fn drop_unaddressable(events: Vec<EventSummary>) -> Vec<EventSummary> {
    let total = events.len();
    let kept: Vec<_> = events.into_iter().filter(|e| !e.id.is_empty()).collect();
    if kept.len() < total {
        tracing::debug!(dropped = total - kept.len(), "Skipping events without an id");
    }
    kept
}
