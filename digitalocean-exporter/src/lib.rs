//! Prometheus exporter for DigitalOcean account resources.
//!
//! Each scrape of the metrics endpoint queries the DigitalOcean API and
//! reports the current state of the account: droplets, volumes, databases,
//! Kubernetes clusters, Spaces buckets and more.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────────┐
//! │ HTTP Server  │────>│ CollectorRegistry │────>│ Collectors (one  │
//! │  (/metrics)  │<────│  (render, errors) │<────│ per resource)    │
//! └──────────────┘     └───────────────────┘     └──────────────────┘
//!                                                   │
//!                                                   v
//!                                      DigitalOcean API / Spaces / status page
//! ```
//!
//! # Usage
//!
//! ```bash
//! DIGITALOCEAN_TOKEN=... digitalocean-exporter --web-addr :9212
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] and [`config::CliArgs`].

pub mod collector;
pub mod config;
pub mod error_counter;
pub mod error_summary;
pub mod http;
pub mod metric;
pub mod registry;
pub mod setup;

pub use collector::{BuildInfo, CollectError, Collector};
pub use config::{CliArgs, ENV_FILE, ExporterConfig, LogFormat, LoggingConfig, load_env_file};
pub use error_counter::ErrorCounter;
pub use error_summary::summarize;
pub use http::HttpServer;
pub use registry::{CollectorRegistry, SharedRegistry};
pub use setup::build_registry;

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG` takes precedence; otherwise the level is `info`, or `debug`
/// when debug logging is enabled.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = if config.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
    }

    Ok(())
}
