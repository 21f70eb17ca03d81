//! ---
//! rsd_section: "01-core-functionality"
//! rsd_subsection: "binary"
//! rsd_type: "source"
//! rsd_scope: "code"
//! rsd_description: "Binary entrypoint for the RoleSync daemon."
//! rsd_version: "v0.1.0-alpha"
//! rsd_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rolesync_common::logging::init_tracing;
use rolesync_common::AppConfig;
use rolesync_metrics::{new_registry, spawn_http_server, DaemonMetrics, ReconcileMetrics};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "RoleSync daemon",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the reconciliation daemon")]
    Run,
    #[command(about = "Load and validate configuration, print the effective settings, and exit")]
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/rolesync.toml"));
    candidates.push(PathBuf::from("configs/rolesync.example.toml"));

    let load_started = Instant::now();
    let loaded = AppConfig::load_with_source(&candidates)?;
    let config = loaded.config;
    let load_duration = load_started.elapsed();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            init_tracing("rolesyncd", &config.logging)?;
            info!(config_path = %loaded.source.display(), "configuration loaded");
            run_daemon(config, load_duration.as_secs_f64()).await?;
        }
        Commands::CheckConfig => {
            let rendered = toml::to_string_pretty(&config)
                .context("failed to render effective configuration")?;
            println!("# effective configuration ({})", loaded.source.display());
            print!("{rendered}");
        }
    }

    Ok(())
}

async fn run_daemon(config: AppConfig, config_load_seconds: f64) -> Result<()> {
    // Startup fault: a missing credential aborts before any connection.
    let token = config
        .discord
        .resolve_token()
        .context("startup aborted: no access credential")?;

    let metrics_settings = config.metrics.clone();
    let mut metrics_server = None;
    let reconcile_metrics = if metrics_settings.enabled {
        let registry = new_registry();
        let daemon_metrics = DaemonMetrics::new(registry.clone())?;
        daemon_metrics.observe_config_load(config_load_seconds);
        daemon_metrics.inc_start();
        let reconcile_metrics = ReconcileMetrics::new(registry.clone())?;
        let server = spawn_http_server(registry, metrics_settings.listen)?;
        info!(address = %server.addr(), "metrics exporter enabled");
        metrics_server = Some(server);
        Some(reconcile_metrics)
    } else {
        info!("metrics exporter disabled by configuration");
        None
    };

    info!(
        marker_role = config.marker.role_id,
        vanity_pattern = %config.marker.vanity_pattern,
        sweep_enabled = config.sweep.enabled,
        sweep_interval_secs = config.sweep.interval.as_secs(),
        "daemon starting"
    );

    let run_result = rolesync_discord::run(config, token, reconcile_metrics).await;

    if let Some(server) = metrics_server {
        if let Err(err) = server.shutdown().await {
            warn!(error = %err, "metrics server shutdown reported an error");
        }
    }

    run_result
}
