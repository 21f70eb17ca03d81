//! ---
//! rsd_section: "01-core-functionality"
//! rsd_subsection: "module"
//! rsd_type: "source"
//! rsd_scope: "code"
//! rsd_description: "Idempotent marker-role reconciliation."
//! rsd_version: "v0.1.0-alpha"
//! rsd_owner: "tbd"
//! ---
use std::sync::Arc;

use tracing::{debug, info, warn};

use rolesync_metrics::ReconcileMetrics;

use crate::gateway::{GatewayError, RoleGateway};
use crate::presence::PresenceEvaluator;
use crate::types::{MemberSnapshot, RoleId};

/// Result of one reconciliation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Actual state already matched the decision; no request issued.
    NoOp,
    /// The marker role was granted.
    Granted,
    /// The marker role was revoked.
    Revoked,
    /// Reconciliation abandoned for this call; no retry scheduled.
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The configured marker role does not resolve in the community.
    RoleNotFound,
    /// The platform denied the mutation request.
    Forbidden,
}

impl Outcome {
    /// Stable label used for logging and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::NoOp => "noop",
            Outcome::Granted => "granted",
            Outcome::Revoked => "revoked",
            Outcome::Skipped(SkipReason::RoleNotFound) => "skipped-role-not-found",
            Outcome::Skipped(SkipReason::Forbidden) => "skipped-forbidden",
        }
    }
}

/// Converges one member's role set with the evaluator's decision.
///
/// Stateless between calls: every invocation re-derives the decision from
/// the snapshot it is handed, so duplicated or reordered triggers collapse
/// into no-ops once the role set matches. At most one mutating request is
/// issued per call.
pub struct RoleReconciler {
    gateway: Arc<dyn RoleGateway>,
    marker_role: RoleId,
    evaluator: PresenceEvaluator,
    metrics: Option<ReconcileMetrics>,
}

impl RoleReconciler {
    pub fn new(
        gateway: Arc<dyn RoleGateway>,
        marker_role: RoleId,
        evaluator: PresenceEvaluator,
        metrics: Option<ReconcileMetrics>,
    ) -> Self {
        Self {
            gateway,
            marker_role,
            evaluator,
            metrics,
        }
    }

    pub fn gateway(&self) -> &Arc<dyn RoleGateway> {
        &self.gateway
    }

    pub fn marker_role(&self) -> RoleId {
        self.marker_role
    }

    pub fn metrics(&self) -> Option<&ReconcileMetrics> {
        self.metrics.as_ref()
    }

    /// Bring the member's marker-role membership in line with their current
    /// presence. Permission faults are absorbed into `Skipped(Forbidden)`;
    /// any other gateway failure propagates for the caller to contain.
    pub async fn reconcile(&self, snapshot: &MemberSnapshot) -> Result<Outcome, GatewayError> {
        if !self
            .gateway
            .role_exists(snapshot.community, self.marker_role)
            .await
        {
            // Configuration fault, not a per-member error. Recurs until the
            // operator fixes the role id, so keep it quiet.
            debug!(
                community = %snapshot.community,
                role = %self.marker_role,
                "marker role does not resolve; skipping reconciliation"
            );
            return Ok(self.finish(snapshot, Outcome::Skipped(SkipReason::RoleNotFound)));
        }

        let qualifies = self.evaluator.qualifies(snapshot);
        let holds = snapshot.holds_role(self.marker_role);

        let outcome = match (qualifies, holds) {
            (true, false) => {
                match self
                    .gateway
                    .grant_role(snapshot.community, snapshot.member, self.marker_role)
                    .await
                {
                    Ok(()) => {
                        info!(
                            community = %snapshot.community,
                            member = %snapshot.member,
                            member_name = %snapshot.display_name,
                            role = %self.marker_role,
                            "marker role granted"
                        );
                        Outcome::Granted
                    }
                    Err(err) if err.is_forbidden() => {
                        warn!(
                            community = %snapshot.community,
                            member = %snapshot.member,
                            member_name = %snapshot.display_name,
                            "cannot grant marker role: permission denied"
                        );
                        Outcome::Skipped(SkipReason::Forbidden)
                    }
                    Err(err) => return Err(err),
                }
            }
            (false, true) => {
                match self
                    .gateway
                    .revoke_role(snapshot.community, snapshot.member, self.marker_role)
                    .await
                {
                    Ok(()) => {
                        info!(
                            community = %snapshot.community,
                            member = %snapshot.member,
                            member_name = %snapshot.display_name,
                            role = %self.marker_role,
                            "marker role revoked"
                        );
                        Outcome::Revoked
                    }
                    Err(err) if err.is_forbidden() => {
                        warn!(
                            community = %snapshot.community,
                            member = %snapshot.member,
                            member_name = %snapshot.display_name,
                            "cannot revoke marker role: permission denied"
                        );
                        Outcome::Skipped(SkipReason::Forbidden)
                    }
                    Err(err) => return Err(err),
                }
            }
            _ => Outcome::NoOp,
        };

        Ok(self.finish(snapshot, outcome))
    }

    fn finish(&self, snapshot: &MemberSnapshot, outcome: Outcome) -> Outcome {
        if let Some(metrics) = &self.metrics {
            metrics.record_outcome(&snapshot.community.to_string(), outcome.label());
        }
        outcome
    }
}
