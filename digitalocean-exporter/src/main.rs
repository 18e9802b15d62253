//! Prometheus exporter for DigitalOcean.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use digitalocean_exporter::{
    BuildInfo, CliArgs, ENV_FILE, ErrorCounter, ExporterConfig, HttpServer, build_registry,
    init_tracing, load_env_file,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging is not up yet; report configuration errors on stderr
    load_env_file(ENV_FILE)?;
    let args = CliArgs::parse();
    let start_time = Utc::now();

    let config = ExporterConfig::resolve(args)?;
    init_tracing(&config.logging)?;

    let build = BuildInfo::current();
    info!(
        version = %build.version,
        revision = %build.revision,
        build_date = %build.build_date,
        "Starting DigitalOcean exporter"
    );

    let listen_addr = config.listen_addr()?;
    let registry = match build_registry(&config, build, ErrorCounter::new(), start_time) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!(error = %e, "Failed to set up collectors");
            return Err(e.into());
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_server = HttpServer::new(registry, listen_addr, config.web.path.clone());
    let mut http_task = tokio::spawn(async move { http_server.run(shutdown_rx).await });

    let sigterm = async {
        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = &mut http_task => {
            // The server only returns on its own when it failed.
            let result = result.map_err(anyhow::Error::from).and_then(|r| r);
            if let Err(e) = &result {
                error!(error = %e, "HTTP server error");
            }
            return result;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = sigterm => {
            info!("Received SIGTERM, shutting down...");
        }
    }

    shutdown_tx.send(true)?;

    if tokio::time::timeout(Duration::from_secs(5), http_task)
        .await
        .is_err()
    {
        error!("HTTP server did not stop in time");
    }

    info!("Exporter stopped");
    Ok(())
}
