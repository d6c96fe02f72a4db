use std::sync::Arc;

use sentri_protocol::{lifecycle, InboundMessage, LiveMessage};

/// Connection lifecycle of a [`crate::WsClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        write!(f, "{s}")
    }
}

/// What a subscriber is called with.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Connected,
    Disconnected,
    /// Automatic reconnection gave up after `attempts` tries.
    ReconnectFailed { attempts: u32 },
    Error(String),
    Message(InboundMessage),
}

impl ClientEvent {
    /// Topic name this event is delivered under. Messages are also delivered
    /// under [`lifecycle::MESSAGE`].
    pub fn topic(&self) -> &str {
        match self {
            Self::Connected => lifecycle::CONNECTED,
            Self::Disconnected => lifecycle::DISCONNECTED,
            Self::ReconnectFailed { .. } => lifecycle::RECONNECT_FAILED,
            Self::Error(_) => lifecycle::ERROR,
            Self::Message(msg) => msg.kind(),
        }
    }

    pub fn message(&self) -> Option<&InboundMessage> {
        match self {
            Self::Message(msg) => Some(msg),
            _ => None,
        }
    }

    /// Typed payload for known message topics.
    pub fn live(&self) -> Option<LiveMessage> {
        self.message().and_then(|msg| LiveMessage::try_from(msg).ok())
    }
}

pub type Callback = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

/// Handle returned by [`crate::WsClient::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);
