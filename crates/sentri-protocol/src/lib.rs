//! SentriAI Protocol - wire types and ingress records
//!
//! Defines the `{ "type": ..., ...payload }` WebSocket envelope, the HTTP
//! endpoints consumed by the dashboard, normalized ingress records and the
//! deterministic fallback datasets shown before any live data arrives.

pub mod constants;
pub mod error;
pub mod fallback;
pub mod levels;
pub mod messages;
pub mod types;

pub use constants::*;
pub use error::*;
pub use levels::*;
pub use messages::*;
pub use types::*;
