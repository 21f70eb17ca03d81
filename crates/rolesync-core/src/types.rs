//! ---
//! rsd_section: "01-core-functionality"
//! rsd_subsection: "module"
//! rsd_type: "source"
//! rsd_scope: "code"
//! rsd_description: "Domain types observed from the platform."
//! rsd_version: "v0.1.0-alpha"
//! rsd_owner: "tbd"
//! ---
use std::fmt;

/// Opaque identifier of a community (guild) on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommunityId(u64);

/// Opaque identifier of a member within a community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(u64);

/// Opaque identifier of a role within a community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleId(u64);

macro_rules! id_impls {
    ($name:ident) => {
        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

id_impls!(CommunityId);
id_impls!(MemberId);
id_impls!(RoleId);

/// A single presence record observed on a member.
///
/// Records are transient: the binding rebuilds them on every observation and
/// nothing in the core caches them. Only the `Custom` variant carries the
/// free-form status text the evaluator inspects; every other variant exists
/// so the evaluator can ignore it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityRecord {
    /// Custom status. The text is absent when the member set only an emoji.
    Custom { text: Option<String> },
    Playing { name: String },
    Streaming { name: String },
    Listening { name: String },
    Watching { name: String },
    Competing { name: String },
    /// Activity kinds the platform may add later.
    Other { name: String },
}

/// A member as observed at one instant: identity, current roles, and the
/// activity records attached to their presence. Owned by the platform; the
/// core reads it and requests mutations through the gateway.
#[derive(Debug, Clone)]
pub struct MemberSnapshot {
    pub community: CommunityId,
    pub member: MemberId,
    pub display_name: String,
    pub is_bot: bool,
    pub roles: Vec<RoleId>,
    pub activities: Vec<ActivityRecord>,
}

impl MemberSnapshot {
    pub fn holds_role(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }
}
