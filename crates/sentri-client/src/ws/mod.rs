//! Shared live channel to the backend.
//!
//! [`WsClient`] owns one WebSocket connection, dispatches inbound records by
//! their `type` to registered callbacks, and reconnects after a fixed delay
//! a bounded number of times. The socket itself sits behind [`WsTransport`].

mod client;
mod events;
mod transport;

pub use client::{WeakWsClient, WsClient, WsConfig};
pub use events::{Callback, ClientEvent, ConnectionState, SubscriptionId};
pub use transport::{
    FrameSink, FrameStream, TransportFuture, TungsteniteTransport, WsConnection, WsTransport,
};
