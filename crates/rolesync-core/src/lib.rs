//! ---
//! rsd_section: "01-core-functionality"
//! rsd_subsection: "module"
//! rsd_type: "source"
//! rsd_scope: "code"
//! rsd_description: "Reconciliation core: evaluator, reconciler, and sweep."
//! rsd_version: "v0.1.0-alpha"
//! rsd_owner: "tbd"
//! ---
//! Platform-independent reconciliation core.
//!
//! The crate is split along the seams the daemon is wired at: domain types,
//! the presence evaluator, the `RoleGateway` platform-binding trait, the
//! reconciler that converges one member's role set, and the periodic sweep
//! that drives the reconciler over every known community.

pub mod gateway;
pub mod presence;
pub mod reconcile;
pub mod sweep;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use gateway::{GatewayError, RoleGateway};
pub use presence::{PresenceEvaluator, VanityPattern};
pub use reconcile::{Outcome, RoleReconciler, SkipReason};
pub use sweep::{run_sweep, spawn_sweep, SweepReport};
pub use types::{ActivityRecord, CommunityId, MemberId, MemberSnapshot, RoleId};
