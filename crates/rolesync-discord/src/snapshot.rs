//! ---
//! rsd_section: "02-platform-binding"
//! rsd_subsection: "module"
//! rsd_type: "source"
//! rsd_scope: "code"
//! rsd_description: "Conversion from serenity model types to core snapshots."
//! rsd_version: "v0.1.0-alpha"
//! rsd_owner: "tbd"
//! ---
use serenity::model::gateway::{Activity, ActivityType};
use serenity::model::guild::Member;
use serenity::model::id::GuildId;

use rolesync_core::{ActivityRecord, CommunityId, MemberId, MemberSnapshot, RoleId};

/// Map one platform activity onto the core's tagged record.
///
/// Only the custom-status text matters to the evaluator; every other kind is
/// preserved by name so the record set stays inspectable in logs and tests.
pub fn activity_record(activity: &Activity) -> ActivityRecord {
    match activity.kind {
        ActivityType::Custom => ActivityRecord::Custom {
            text: activity.state.clone(),
        },
        ActivityType::Playing => ActivityRecord::Playing {
            name: activity.name.clone(),
        },
        ActivityType::Streaming => ActivityRecord::Streaming {
            name: activity.name.clone(),
        },
        ActivityType::Listening => ActivityRecord::Listening {
            name: activity.name.clone(),
        },
        ActivityType::Watching => ActivityRecord::Watching {
            name: activity.name.clone(),
        },
        ActivityType::Competing => ActivityRecord::Competing {
            name: activity.name.clone(),
        },
        _ => ActivityRecord::Other {
            name: activity.name.clone(),
        },
    }
}

/// Build a fresh observation of one member from cached platform state.
pub fn from_member(guild_id: GuildId, member: &Member, activities: &[Activity]) -> MemberSnapshot {
    MemberSnapshot {
        community: CommunityId::new(guild_id.get()),
        member: MemberId::new(member.user.id.get()),
        display_name: member.display_name().to_owned(),
        is_bot: member.user.bot,
        roles: member.roles.iter().map(|role| RoleId::new(role.get())).collect(),
        activities: activities.iter().map(activity_record).collect(),
    }
}
