//! ---
//! rsd_section: "15-testing-qa-runbook"
//! rsd_subsection: "module"
//! rsd_type: "source"
//! rsd_scope: "code"
//! rsd_description: "In-memory fake gateway shared by the core unit tests."
//! rsd_version: "v0.1.0-alpha"
//! rsd_owner: "tbd"
//! ---
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::gateway::{GatewayError, RoleGateway};
use crate::types::{ActivityRecord, CommunityId, MemberId, MemberSnapshot, RoleId};

pub const COMMUNITY: CommunityId = CommunityId::new(100);
pub const MARKER_ROLE: RoleId = RoleId::new(1396710984491728967);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Grant,
    Revoke,
}

#[derive(Default)]
struct State {
    roles: HashMap<CommunityId, HashSet<RoleId>>,
    members: HashMap<CommunityId, Vec<MemberSnapshot>>,
    attempts: Vec<(MutationKind, CommunityId, MemberId, RoleId)>,
    deny_mutations: bool,
    fail_mutations: Option<String>,
    fail_members_for: HashSet<CommunityId>,
}

/// In-memory platform stand-in. Mutations that succeed are applied to the
/// stored member snapshots so a re-observation sees the corrected state.
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<State>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway with one community in which the marker role resolves.
    pub fn with_marker_role() -> Self {
        let gateway = Self::new();
        gateway.add_community(COMMUNITY, &[MARKER_ROLE]);
        gateway
    }

    pub fn add_community(&self, community: CommunityId, roles: &[RoleId]) {
        let mut state = self.state.lock();
        state.roles.insert(community, roles.iter().copied().collect());
        state.members.entry(community).or_default();
    }

    pub fn add_member(&self, snapshot: MemberSnapshot) {
        let mut state = self.state.lock();
        state.members.entry(snapshot.community).or_default().push(snapshot);
    }

    pub fn deny_mutations(&self) {
        self.state.lock().deny_mutations = true;
    }

    pub fn fail_mutations(&self, reason: &str) {
        self.state.lock().fail_mutations = Some(reason.to_owned());
    }

    pub fn fail_members(&self, community: CommunityId) {
        self.state.lock().fail_members_for.insert(community);
    }

    /// Re-observe one member, as a fresh trigger would.
    pub fn member(&self, community: CommunityId, member: MemberId) -> Option<MemberSnapshot> {
        let state = self.state.lock();
        state
            .members
            .get(&community)?
            .iter()
            .find(|m| m.member == member)
            .cloned()
    }

    /// Mutation requests attempted so far, in order, successful or not.
    pub fn attempts(&self) -> Vec<(MutationKind, MemberId)> {
        self.state
            .lock()
            .attempts
            .iter()
            .map(|(kind, _, member, _)| (*kind, *member))
            .collect()
    }

    fn mutate(
        &self,
        kind: MutationKind,
        community: CommunityId,
        member: MemberId,
        role: RoleId,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.attempts.push((kind, community, member, role));
        if let Some(reason) = &state.fail_mutations {
            return Err(GatewayError::Platform(reason.clone()));
        }
        if state.deny_mutations {
            return Err(GatewayError::Forbidden);
        }
        let snapshot = state
            .members
            .get_mut(&community)
            .and_then(|members| members.iter_mut().find(|m| m.member == member))
            .ok_or_else(|| GatewayError::Unavailable(format!("member {member} not cached")))?;
        match kind {
            MutationKind::Grant => {
                if !snapshot.roles.contains(&role) {
                    snapshot.roles.push(role);
                }
            }
            MutationKind::Revoke => snapshot.roles.retain(|r| *r != role),
        }
        Ok(())
    }
}

#[async_trait]
impl RoleGateway for FakeGateway {
    async fn communities(&self) -> Vec<CommunityId> {
        let mut communities: Vec<_> = self.state.lock().members.keys().copied().collect();
        communities.sort();
        communities
    }

    async fn role_exists(&self, community: CommunityId, role: RoleId) -> bool {
        self.state
            .lock()
            .roles
            .get(&community)
            .is_some_and(|roles| roles.contains(&role))
    }

    async fn members(&self, community: CommunityId) -> Result<Vec<MemberSnapshot>, GatewayError> {
        let state = self.state.lock();
        if state.fail_members_for.contains(&community) {
            return Err(GatewayError::Unavailable(format!(
                "member list for community {community} unavailable"
            )));
        }
        Ok(state.members.get(&community).cloned().unwrap_or_default())
    }

    async fn grant_role(
        &self,
        community: CommunityId,
        member: MemberId,
        role: RoleId,
    ) -> Result<(), GatewayError> {
        self.mutate(MutationKind::Grant, community, member, role)
    }

    async fn revoke_role(
        &self,
        community: CommunityId,
        member: MemberId,
        role: RoleId,
    ) -> Result<(), GatewayError> {
        self.mutate(MutationKind::Revoke, community, member, role)
    }
}

/// Snapshot helper for evaluator tests that only care about activities.
pub fn snapshot_with_activities(activities: Vec<ActivityRecord>) -> MemberSnapshot {
    MemberSnapshot {
        community: COMMUNITY,
        member: MemberId::new(1),
        display_name: "tester".to_owned(),
        is_bot: false,
        roles: Vec::new(),
        activities,
    }
}

/// Snapshot helper for reconciler and sweep tests.
pub fn member_in(
    community: CommunityId,
    member: u64,
    roles: Vec<RoleId>,
    activities: Vec<ActivityRecord>,
) -> MemberSnapshot {
    MemberSnapshot {
        community,
        member: MemberId::new(member),
        display_name: format!("member-{member}"),
        is_bot: false,
        roles,
        activities,
    }
}

/// Bot variant of [`member_in`].
pub fn bot_in(community: CommunityId, member: u64) -> MemberSnapshot {
    MemberSnapshot {
        is_bot: true,
        ..member_in(community, member, Vec::new(), Vec::new())
    }
}
