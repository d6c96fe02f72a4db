use thiserror::Error;

/// Errors raised while decoding wire data.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("frame has no string `type` field")]
    MissingType,

    #[error("unknown topic '{0}'")]
    UnknownTopic(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
