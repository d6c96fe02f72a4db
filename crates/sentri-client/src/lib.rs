//! SentriAI Client - the dashboard's data-refresh layer
//!
//! - [`Poller`]: periodic fetch with last-cycle-wins cancellation and
//!   fallback data when nothing has ever loaded.
//! - [`ApiClient`]: typed access to the backend's HTTP endpoints.
//! - [`WsClient`]: a shared live channel with typed dispatch and bounded,
//!   fixed-delay reconnection.
//!
//! All constructors that spawn work must run inside a Tokio runtime.

pub mod api;
pub mod error;
pub mod fetcher;
pub mod poller;
pub mod ws;

pub use api::{ApiClient, ApiConfig};
pub use error::{ClientError, FetchError};
pub use fetcher::{FetchFuture, Fetcher, HttpFetcher};
pub use poller::{PollSnapshot, Poller};
pub use ws::{ClientEvent, ConnectionState, SubscriptionId, WeakWsClient, WsClient, WsConfig};
