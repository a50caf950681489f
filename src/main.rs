use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use metrics_exporter_prometheus::PrometheusBuilder;
use responder::{wait_for_shutdown_signal, Application, Collaborators, ShutdownManager};
use responder_core::{init_logging, AppConfig};
use tracing::{error, info, warn};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("responder")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Emergency incident classification and facility-matching dispatch service")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help(
                    "Configuration file path [default: first of config/responder.toml, \
                     responder.toml, /etc/responder/config.toml]",
                ),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Overrides observability.log_level")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("Overrides observability.log_format")
                .value_parser(["text", "json", "pretty"]),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").map(String::as_str);
    let config_source = config_path.unwrap_or("default search paths");

    let config = AppConfig::load(config_path)
        .with_context(|| format!("failed to load configuration from {config_source}"))?;

    let log_level = matches
        .get_one::<String>("log-level")
        .cloned()
        .unwrap_or_else(|| config.observability.log_level.clone());
    let log_format = matches
        .get_one::<String>("log-format")
        .cloned()
        .unwrap_or_else(|| config.observability.log_format.clone());
    init_logging(&log_level, &log_format)?;

    info!(config = config_source, "starting responder");

    if config.observability.metrics_enabled {
        install_metrics_exporter(&config.observability.metrics_bind_address)?;
    }

    let collaborators = Collaborators::from_config(&config)?;
    let shutdown_manager = ShutdownManager::new();
    let app = Application::new(config, collaborators, &shutdown_manager);

    let app_handle = {
        let shutdown_rx = shutdown_manager.subscribe();
        tokio::spawn(async move {
            if let Err(e) = app.run(shutdown_rx).await {
                error!(error = %e, "application stopped with an error");
            }
        })
    };

    wait_for_shutdown_signal().await;
    info!("shutting down");
    shutdown_manager.shutdown().await;

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, app_handle).await {
        Ok(Ok(())) => info!("shutdown complete"),
        Ok(Err(e)) => error!(error = %e, "application task panicked"),
        Err(_) => warn!("shutdown timed out, exiting with work in flight"),
    }

    Ok(())
}

fn install_metrics_exporter(bind_address: &str) -> Result<()> {
    let addr: SocketAddr = bind_address
        .parse()
        .with_context(|| format!("invalid metrics bind address: {bind_address}"))?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus exporter: {e}"))?;
    info!("Prometheus metrics exposed on http://{addr}/metrics");
    Ok(())
}
