use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sentri_connector::{monitor, ConnectorConfig, MockBackend, MockOptions, MonitorOptions};

/// SentriAI dashboard data layer: live monitor and mock backend.
#[derive(Debug, Parser)]
#[command(name = "sentri-connector", version, about)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Poll an event report and follow live updates until Ctrl-C.
    Monitor {
        /// Event to report on.
        #[arg(long)]
        event: Option<String>,

        /// Camera to subscribe to; repeatable.
        #[arg(long = "camera")]
        cameras: Vec<String>,

        /// Load the report once instead of polling.
        #[arg(long)]
        no_live: bool,

        /// Use simulated crowd telemetry.
        #[arg(long)]
        simulate: bool,
    },
    /// Serve simulated data on the dashboard's HTTP and WebSocket endpoints.
    MockBackend {
        #[arg(long, default_value = "127.0.0.1:8000")]
        bind: String,

        /// Milliseconds between simulation steps and pushes.
        #[arg(long, default_value_t = 2_000)]
        push_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let config = ConnectorConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Monitor {
            event,
            cameras,
            no_live,
            simulate,
        } => {
            let options = MonitorOptions {
                event_id: event,
                cameras,
                no_live,
                simulate,
            };
            monitor::run(&config, options).await
        }
        Command::MockBackend { bind, push_ms } => {
            let backend = MockBackend::new(MockOptions {
                push_interval: Duration::from_millis(push_ms.max(100)),
                seed: config.telemetry.seed,
            });
            backend
                .run(&bind)
                .await
                .with_context(|| format!("mock backend failed on {bind}"))
        }
    }
}
