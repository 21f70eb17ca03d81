//! ---
//! rsd_section: "03-observability"
//! rsd_subsection: "module"
//! rsd_type: "source"
//! rsd_scope: "code"
//! rsd_description: "Metrics collection and export utilities."
//! rsd_version: "v0.1.0-alpha"
//! rsd_owner: "tbd"
//! ---
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, StatusCode};
use axum::routing::get;
use axum::{response::IntoResponse, Router};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Shared registry type used across the workspace.
pub type SharedRegistry = Arc<Registry>;

/// Produce a new shared registry.
pub fn new_registry() -> SharedRegistry {
    Arc::new(Registry::new())
}

/// Spawn an HTTP server that exposes the registry at `/metrics`.
pub fn spawn_http_server(registry: SharedRegistry, addr: SocketAddr) -> Result<MetricsServer> {
    let app = Router::new().route(
        "/metrics",
        get({
            let registry = registry.clone();
            move || metrics_handler(registry.clone())
        }),
    );

    let std_listener = StdTcpListener::bind(addr)
        .with_context(|| format!("failed to bind metrics listener {}", addr))?;
    std_listener
        .set_nonblocking(true)
        .with_context(|| "failed to configure metrics listener as non-blocking")?;
    let listener = tokio::net::TcpListener::from_std(std_listener)
        .with_context(|| "failed to convert std listener into tokio listener")?;

    info!(address = %addr, "metrics server starting");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let service = app.into_make_service();
    let handle: JoinHandle<Result<()>> = tokio::spawn(async move {
        axum::serve(listener, service)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
            .context("metrics server encountered an error")?;
        Ok(())
    });

    Ok(MetricsServer {
        addr,
        shutdown: Some(shutdown_tx),
        task: handle,
    })
}

/// Prometheus scrape endpoint.
async fn metrics_handler(registry: SharedRegistry) -> impl IntoResponse {
    let families = registry.gather();
    let encoder = TextEncoder::new();
    match encoder.encode_to_string(&families) {
        Ok(body) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_str(encoder.format_type())
                    .expect("prometheus format type is a valid header value"),
            )],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                String::from("metrics encoding error"),
            )
                .into_response()
        }
    }
}

/// Handle to the running HTTP exporter.
#[derive(Debug)]
pub struct MetricsServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl MetricsServer {
    /// Return the bound address for convenience.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal shutdown and await task completion.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.task.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err),
            Err(join_err) => Err(anyhow::Error::new(join_err)),
        }
    }
}

/// Metrics recorded by the daemon process itself.
#[derive(Clone)]
pub struct DaemonMetrics {
    starts_total: IntCounter,
    config_load_seconds: Histogram,
}

impl DaemonMetrics {
    pub fn new(registry: SharedRegistry) -> Result<Self> {
        let starts_total = IntCounter::with_opts(Opts::new(
            "rolesyncd_starts_total",
            "Total number of times the RoleSync daemon has initialised",
        ))?;
        registry.register(Box::new(starts_total.clone()))?;

        let buckets = prometheus::exponential_buckets(0.001, 2.0, 16)
            .context("failed to construct histogram buckets")?;
        let config_load_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "rolesyncd_config_load_seconds",
                "Time spent loading and validating configuration",
            )
            .buckets(buckets),
        )?;
        registry.register(Box::new(config_load_seconds.clone()))?;

        Ok(Self {
            starts_total,
            config_load_seconds,
        })
    }

    pub fn inc_start(&self) {
        self.starts_total.inc();
    }

    pub fn observe_config_load(&self, seconds: f64) {
        self.config_load_seconds.observe(seconds);
    }
}

/// Metrics recorded by the reconciliation core.
#[derive(Clone, Debug)]
pub struct ReconcileMetrics {
    outcomes: IntCounterVec,
    sweep_runs: IntCounter,
    sweep_duration_seconds: Histogram,
    members_examined: IntGauge,
}

impl ReconcileMetrics {
    pub fn new(registry: SharedRegistry) -> Result<Self> {
        let outcomes = IntCounterVec::new(
            Opts::new(
                "rolesync_reconcile_outcomes_total",
                "Count of reconciliation outcomes by community and outcome kind",
            ),
            &["community", "outcome"],
        )?;
        registry.register(Box::new(outcomes.clone()))?;

        let sweep_runs = IntCounter::with_opts(Opts::new(
            "rolesync_sweep_runs_total",
            "Number of completed periodic membership sweeps",
        ))?;
        registry.register(Box::new(sweep_runs.clone()))?;

        let buckets = prometheus::exponential_buckets(0.01, 2.0, 14)
            .context("failed to construct sweep histogram buckets")?;
        let sweep_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "rolesync_sweep_duration_seconds",
                "Wall-clock duration of a full membership sweep",
            )
            .buckets(buckets),
        )?;
        registry.register(Box::new(sweep_duration_seconds.clone()))?;

        let members_examined = IntGauge::with_opts(Opts::new(
            "rolesync_sweep_members_examined",
            "Members examined during the most recent sweep",
        ))?;
        registry.register(Box::new(members_examined.clone()))?;

        Ok(Self {
            outcomes,
            sweep_runs,
            sweep_duration_seconds,
            members_examined,
        })
    }

    pub fn record_outcome(&self, community: &str, outcome: &str) {
        self.outcomes.with_label_values(&[community, outcome]).inc();
    }

    pub fn record_sweep(&self, duration_seconds: f64, members_examined: usize) {
        self.sweep_runs.inc();
        self.sweep_duration_seconds.observe(duration_seconds);
        self.members_examined.set(members_examined as i64);
    }
}

pub use prometheus;
