//! SentriAI Connector - configuration, live monitor and mock backend behind
//! the `sentri-connector` binary.

pub mod config;
pub mod mock_server;
pub mod monitor;

pub use config::ConnectorConfig;
pub use mock_server::{MockBackend, MockOptions};
pub use monitor::MonitorOptions;
