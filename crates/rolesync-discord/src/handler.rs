//! ---
//! rsd_section: "02-platform-binding"
//! rsd_subsection: "module"
//! rsd_type: "source"
//! rsd_scope: "code"
//! rsd_description: "Gateway event handler feeding the push trigger."
//! rsd_version: "v0.1.0-alpha"
//! rsd_owner: "tbd"
//! ---
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serenity::async_trait;
use serenity::client::{Context, EventHandler};
use serenity::model::event::GuildMemberUpdateEvent;
use serenity::model::gateway::{Presence, Ready};
use serenity::model::guild::Member;
use serenity::model::id::GuildId;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use rolesync_common::SweepConfig;
use rolesync_core::{
    spawn_sweep, MemberSnapshot, PresenceEvaluator, RoleId, RoleReconciler,
};
use rolesync_metrics::ReconcileMetrics;

use crate::gateway::SerenityGateway;
use crate::snapshot;

/// Serenity event handler: wires the push trigger (presence and member
/// updates) and the on-ready hook that starts the pull trigger.
pub struct Handler {
    marker_role: RoleId,
    evaluator: PresenceEvaluator,
    sweep: SweepConfig,
    metrics: Option<ReconcileMetrics>,
    shutdown: broadcast::Sender<()>,
    // The reconciler needs the client's HTTP/cache handles, which only exist
    // once the client is running; built on first event.
    reconciler: OnceCell<Arc<RoleReconciler>>,
    sweep_started: AtomicBool,
}

impl Handler {
    pub fn new(
        marker_role: RoleId,
        evaluator: PresenceEvaluator,
        sweep: SweepConfig,
        metrics: Option<ReconcileMetrics>,
        shutdown: broadcast::Sender<()>,
    ) -> Self {
        Self {
            marker_role,
            evaluator,
            sweep,
            metrics,
            shutdown,
            reconciler: OnceCell::new(),
            sweep_started: AtomicBool::new(false),
        }
    }

    fn reconciler(&self, ctx: &Context) -> Arc<RoleReconciler> {
        self.reconciler
            .get_or_init(|| {
                let gateway =
                    Arc::new(SerenityGateway::new(ctx.http.clone(), ctx.cache.clone()));
                Arc::new(RoleReconciler::new(
                    gateway,
                    self.marker_role,
                    self.evaluator.clone(),
                    self.metrics.clone(),
                ))
            })
            .clone()
    }

    async fn reconcile(&self, ctx: &Context, snapshot: MemberSnapshot) {
        if snapshot.is_bot {
            return;
        }
        let reconciler = self.reconciler(ctx);
        if let Err(err) = reconciler.reconcile(&snapshot).await {
            warn!(
                community = %snapshot.community,
                member = %snapshot.member,
                error = %err,
                "push-triggered reconciliation failed"
            );
        }
    }
}

/// Rebuild a member observation from a presence update. `None` when the
/// member is not cached yet; the periodic sweep will pick them up.
fn presence_snapshot(ctx: &Context, presence: &Presence) -> Option<MemberSnapshot> {
    let guild_id = presence.guild_id?;
    let guild = ctx.cache.guild(guild_id)?;
    let member = guild.members.get(&presence.user.id)?;
    Some(snapshot::from_member(guild_id, member, &presence.activities))
}

/// Rebuild a member observation from a member update, pairing the updated
/// role set with the cached presence activities.
fn member_update_snapshot(
    ctx: &Context,
    event: &GuildMemberUpdateEvent,
    new: Option<&Member>,
) -> Option<MemberSnapshot> {
    let guild_id = event.guild_id;
    let guild = ctx.cache.guild(guild_id)?;
    let activities = guild
        .presences
        .get(&event.user.id)
        .map(|presence| presence.activities.as_slice())
        .unwrap_or_default();
    match new {
        Some(member) => Some(snapshot::from_member(guild_id, member, activities)),
        None => guild
            .members
            .get(&event.user.id)
            .map(|member| snapshot::from_member(guild_id, member, activities)),
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            account = %ready.user.name,
            guilds = ready.guilds.len(),
            "gateway session ready"
        );
    }

    async fn cache_ready(&self, ctx: Context, guilds: Vec<GuildId>) {
        if !self.sweep.enabled {
            debug!("periodic sweep disabled by configuration");
            return;
        }
        // Sessions can resume after reconnects; the sweep starts once.
        if self.sweep_started.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(
            guilds = guilds.len(),
            interval_secs = self.sweep.interval.as_secs(),
            "starting periodic membership sweep"
        );
        spawn_sweep(
            self.reconciler(&ctx),
            self.sweep.interval,
            self.shutdown.subscribe(),
        );
    }

    async fn presence_update(&self, ctx: Context, new_data: Presence) {
        if new_data.user.bot.unwrap_or(false) {
            return;
        }
        let Some(snapshot) = presence_snapshot(&ctx, &new_data) else {
            debug!(user = %new_data.user.id, "presence update for uncached member ignored");
            return;
        };
        self.reconcile(&ctx, snapshot).await;
    }

    async fn guild_member_update(
        &self,
        ctx: Context,
        _old_if_available: Option<Member>,
        new: Option<Member>,
        event: GuildMemberUpdateEvent,
    ) {
        if event.user.bot {
            return;
        }
        let Some(snapshot) = member_update_snapshot(&ctx, &event, new.as_ref()) else {
            debug!(user = %event.user.id, "member update for uncached member ignored");
            return;
        };
        self.reconcile(&ctx, snapshot).await;
    }
}
