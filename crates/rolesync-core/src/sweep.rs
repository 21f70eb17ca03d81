//! ---
//! rsd_section: "01-core-functionality"
//! rsd_subsection: "module"
//! rsd_type: "source"
//! rsd_scope: "code"
//! rsd_description: "Periodic full-membership sweep driving the reconciler."
//! rsd_version: "v0.1.0-alpha"
//! rsd_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::reconcile::{Outcome, RoleReconciler};

/// Tally of one full sweep across every known community.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub communities: usize,
    pub members_examined: usize,
    pub granted: usize,
    pub revoked: usize,
    pub noops: usize,
    pub skipped: usize,
    pub failures: usize,
}

impl SweepReport {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::NoOp => self.noops += 1,
            Outcome::Granted => self.granted += 1,
            Outcome::Revoked => self.revoked += 1,
            Outcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Reconcile every non-automated member of every known community once.
///
/// Drift-correction safety net behind the push trigger: sequential by
/// design, O(total members) per call. Per-member faults are logged and
/// counted, never propagated; a failed member never aborts the sweep.
pub async fn run_sweep(reconciler: &RoleReconciler) -> SweepReport {
    let mut report = SweepReport::default();
    let gateway = reconciler.gateway().clone();
    let marker_role = reconciler.marker_role();

    for community in gateway.communities().await {
        report.communities += 1;
        if !gateway.role_exists(community, marker_role).await {
            debug!(%community, role = %marker_role, "marker role unresolved; skipping community");
            continue;
        }

        let members = match gateway.members(community).await {
            Ok(members) => members,
            Err(err) => {
                warn!(%community, error = %err, "failed to enumerate members; skipping community");
                report.failures += 1;
                continue;
            }
        };

        for member in members.iter().filter(|member| !member.is_bot) {
            report.members_examined += 1;
            match reconciler.reconcile(member).await {
                Ok(outcome) => report.record(outcome),
                Err(err) => {
                    warn!(
                        %community,
                        member = %member.member,
                        error = %err,
                        "reconciliation failed; continuing sweep"
                    );
                    report.failures += 1;
                }
            }
        }
    }

    report
}

/// Spawn the pull trigger: a fixed-interval sweep loop that runs until the
/// shutdown channel fires. The first tick fires immediately so a freshly
/// started daemon converges without waiting a full interval.
pub fn spawn_sweep(
    reconciler: Arc<RoleReconciler>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("sweep shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {
                    let started = Instant::now();
                    let report = run_sweep(&reconciler).await;
                    let elapsed = started.elapsed();
                    if let Some(metrics) = reconciler.metrics() {
                        metrics.record_sweep(elapsed.as_secs_f64(), report.members_examined);
                    }
                    info!(
                        communities = report.communities,
                        members = report.members_examined,
                        granted = report.granted,
                        revoked = report.revoked,
                        noops = report.noops,
                        skipped = report.skipped,
                        failures = report.failures,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "membership sweep complete"
                    );
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::{PresenceEvaluator, VanityPattern};
    use crate::test_support::{bot_in, member_in, FakeGateway, COMMUNITY, MARKER_ROLE};
    use crate::types::{ActivityRecord, CommunityId};

    fn reconciler(gateway: Arc<FakeGateway>) -> RoleReconciler {
        let evaluator = PresenceEvaluator::new(
            VanityPattern::new("discord.gg/silvermart").expect("valid pattern"),
        );
        RoleReconciler::new(gateway, MARKER_ROLE, evaluator, None)
    }

    fn vanity_status() -> ActivityRecord {
        ActivityRecord::Custom {
            text: Some("discord.gg/silvermart".to_owned()),
        }
    }

    #[tokio::test]
    async fn sweep_corrects_only_drifted_members() {
        let gateway = Arc::new(FakeGateway::with_marker_role());
        // Drifted: qualifies but lacks the role.
        gateway.add_member(member_in(COMMUNITY, 1, vec![], vec![vanity_status()]));
        // Drifted: holds the role but no longer qualifies.
        gateway.add_member(member_in(COMMUNITY, 2, vec![MARKER_ROLE], vec![]));
        // Settled both ways.
        gateway.add_member(member_in(COMMUNITY, 3, vec![MARKER_ROLE], vec![vanity_status()]));
        gateway.add_member(member_in(COMMUNITY, 4, vec![], vec![]));

        let report = run_sweep(&reconciler(gateway.clone())).await;

        assert_eq!(report.members_examined, 4);
        assert_eq!(report.granted, 1);
        assert_eq!(report.revoked, 1);
        assert_eq!(report.noops, 2);
        assert_eq!(report.failures, 0);
        assert_eq!(gateway.attempts().len(), 2);
    }

    #[tokio::test]
    async fn sweep_ignores_automated_members() {
        let gateway = Arc::new(FakeGateway::with_marker_role());
        gateway.add_member(bot_in(COMMUNITY, 9));
        gateway.add_member(member_in(COMMUNITY, 1, vec![], vec![vanity_status()]));

        let report = run_sweep(&reconciler(gateway.clone())).await;

        assert_eq!(report.members_examined, 1);
        assert_eq!(report.granted, 1);
    }

    #[tokio::test]
    async fn sweep_skips_communities_without_the_marker_role() {
        let gateway = Arc::new(FakeGateway::with_marker_role());
        let unconfigured = CommunityId::new(200);
        gateway.add_community(unconfigured, &[]);
        gateway.add_member(member_in(unconfigured, 5, vec![], vec![vanity_status()]));
        gateway.add_member(member_in(COMMUNITY, 1, vec![], vec![vanity_status()]));

        let report = run_sweep(&reconciler(gateway.clone())).await;

        assert_eq!(report.communities, 2);
        assert_eq!(report.members_examined, 1);
        assert_eq!(report.granted, 1);
        assert!(gateway.member(unconfigured, 5.into()).is_some());
    }

    #[tokio::test]
    async fn member_listing_failure_does_not_abort_the_sweep() {
        let gateway = Arc::new(FakeGateway::with_marker_role());
        let broken = CommunityId::new(50);
        gateway.add_community(broken, &[MARKER_ROLE]);
        gateway.fail_members(broken);
        gateway.add_member(member_in(COMMUNITY, 1, vec![], vec![vanity_status()]));

        let report = run_sweep(&reconciler(gateway.clone())).await;

        assert_eq!(report.failures, 1);
        assert_eq!(report.granted, 1);
    }

    #[tokio::test]
    async fn sweep_task_stops_on_shutdown() {
        let gateway = Arc::new(FakeGateway::with_marker_role());
        let reconciler = Arc::new(reconciler(gateway));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = spawn_sweep(reconciler, Duration::from_secs(3600), shutdown_rx);
        shutdown_tx.send(()).expect("receiver alive");
        handle.await.expect("sweep task joins cleanly");
    }
}
