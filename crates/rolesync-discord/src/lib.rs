//! ---
//! rsd_section: "02-platform-binding"
//! rsd_subsection: "module"
//! rsd_type: "source"
//! rsd_scope: "code"
//! rsd_description: "Discord client construction and lifecycle wiring."
//! rsd_version: "v0.1.0-alpha"
//! rsd_owner: "tbd"
//! ---
//! Discord binding for the reconciliation core.
//!
//! Everything platform-specific lives here: the serenity client, the
//! `RoleGateway` implementation over its HTTP and cache handles, the
//! snapshot conversion, and the gateway event handler that feeds the
//! push trigger. The core never sees a serenity type.

pub mod gateway;
pub mod handler;
pub mod snapshot;

use anyhow::{Context as _, Result};
use serenity::client::Client;
use serenity::model::gateway::GatewayIntents;
use tokio::sync::broadcast;
use tracing::{error, info};

use rolesync_common::AppConfig;
use rolesync_core::{PresenceEvaluator, RoleId, VanityPattern};
use rolesync_metrics::ReconcileMetrics;

use crate::handler::Handler;

/// Build the gateway client and run it until the process is signalled.
///
/// Blocks on the serenity event loop; ctrl-c tears the shard down and stops
/// the periodic sweep through the shared shutdown channel.
pub async fn run(config: AppConfig, token: String, metrics: Option<ReconcileMetrics>) -> Result<()> {
    let pattern = VanityPattern::new(&config.marker.vanity_pattern)
        .context("invalid marker.vanity_pattern")?;
    let evaluator = PresenceEvaluator::new(pattern);
    let marker_role = RoleId::new(config.marker.role_id);

    let (shutdown_tx, _) = broadcast::channel(4);
    let handler = Handler::new(
        marker_role,
        evaluator,
        config.sweep.clone(),
        metrics,
        shutdown_tx.clone(),
    );

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_PRESENCES;

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await
        .context("failed to construct gateway client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            return;
        }
        info!("ctrl-c received; shutting down");
        let _ = shutdown_tx.send(());
        shard_manager.shutdown_all().await;
    });

    client
        .start()
        .await
        .context("gateway client terminated with error")?;

    info!("gateway client stopped");
    Ok(())
}
