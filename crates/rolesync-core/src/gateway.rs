//! ---
//! rsd_section: "02-platform-binding"
//! rsd_subsection: "module"
//! rsd_type: "source"
//! rsd_scope: "code"
//! rsd_description: "Platform-binding trait consumed by the reconciliation core."
//! rsd_version: "v0.1.0-alpha"
//! rsd_owner: "tbd"
//! ---
use async_trait::async_trait;
use thiserror::Error;

use crate::types::{CommunityId, MemberId, MemberSnapshot, RoleId};

/// Failures surfaced by a platform binding.
///
/// `Forbidden` is kept distinguishable from every other failure because the
/// reconciler treats a permission fault as a per-member skip rather than an
/// error worth propagating.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("permission denied by platform")]
    Forbidden,
    #[error("platform data unavailable: {0}")]
    Unavailable(String),
    #[error("platform request failed: {0}")]
    Platform(String),
}

impl GatewayError {
    pub fn is_forbidden(&self) -> bool {
        matches!(self, GatewayError::Forbidden)
    }
}

/// Surface the core consumes from the platform.
///
/// Production wires this to the chat platform's HTTP and cache handles; tests
/// wire it to an in-memory fake. All role mutations flow through here so a
/// reconciliation's side effects stay observable and bounded.
#[async_trait]
pub trait RoleGateway: Send + Sync {
    /// Communities currently known to the binding.
    async fn communities(&self) -> Vec<CommunityId>;

    /// Whether `role` resolves within `community`.
    async fn role_exists(&self, community: CommunityId, role: RoleId) -> bool;

    /// Enumerate the community's members as fresh snapshots.
    async fn members(&self, community: CommunityId) -> Result<Vec<MemberSnapshot>, GatewayError>;

    /// Issue a single grant request for `role` on `member`.
    async fn grant_role(
        &self,
        community: CommunityId,
        member: MemberId,
        role: RoleId,
    ) -> Result<(), GatewayError>;

    /// Issue a single revoke request for `role` on `member`.
    async fn revoke_role(
        &self,
        community: CommunityId,
        member: MemberId,
        role: RoleId,
    ) -> Result<(), GatewayError>;
}
