use thiserror::Error;

/// Failure of a single HTTP fetch.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Errors reported by the client layer. Never panics, never thrown across
/// callbacks: the WebSocket client surfaces these as return values or
/// `error` events.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("websocket is not open")]
    NotConnected,

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),
}
