//! ---
//! rsd_section: "02-platform-binding"
//! rsd_subsection: "module"
//! rsd_type: "source"
//! rsd_scope: "code"
//! rsd_description: "RoleGateway implementation over serenity HTTP and cache."
//! rsd_version: "v0.1.0-alpha"
//! rsd_owner: "tbd"
//! ---
use std::sync::Arc;

use async_trait::async_trait;
use serenity::cache::Cache;
use serenity::http::{Http, HttpError};
use serenity::model::id::{GuildId, RoleId as DiscordRoleId, UserId};

use rolesync_core::{CommunityId, GatewayError, MemberId, MemberSnapshot, RoleGateway, RoleId};

use crate::snapshot;

/// Audit-log reasons attached to the two mutation requests.
const GRANT_REASON: &str = "vanity detected in status";
const REVOKE_REASON: &str = "vanity removed from status";

/// `RoleGateway` over the serenity HTTP and cache handles.
///
/// Reads come from the gateway-fed cache; only the two role mutations hit
/// the REST API.
pub struct SerenityGateway {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }
}

fn map_platform_error(err: serenity::Error) -> GatewayError {
    match &err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 403 =>
        {
            GatewayError::Forbidden
        }
        _ => GatewayError::Platform(err.to_string()),
    }
}

#[async_trait]
impl RoleGateway for SerenityGateway {
    async fn communities(&self) -> Vec<CommunityId> {
        self.cache
            .guilds()
            .into_iter()
            .map(|guild_id| CommunityId::new(guild_id.get()))
            .collect()
    }

    async fn role_exists(&self, community: CommunityId, role: RoleId) -> bool {
        self.cache
            .guild(GuildId::new(community.get()))
            .map(|guild| guild.roles.contains_key(&DiscordRoleId::new(role.get())))
            .unwrap_or(false)
    }

    async fn members(&self, community: CommunityId) -> Result<Vec<MemberSnapshot>, GatewayError> {
        let guild_id = GuildId::new(community.get());
        let guild = self.cache.guild(guild_id).ok_or_else(|| {
            GatewayError::Unavailable(format!("community {community} not cached"))
        })?;
        Ok(guild
            .members
            .values()
            .map(|member| {
                let activities = guild
                    .presences
                    .get(&member.user.id)
                    .map(|presence| presence.activities.as_slice())
                    .unwrap_or_default();
                snapshot::from_member(guild_id, member, activities)
            })
            .collect())
    }

    async fn grant_role(
        &self,
        community: CommunityId,
        member: MemberId,
        role: RoleId,
    ) -> Result<(), GatewayError> {
        self.http
            .add_member_role(
                GuildId::new(community.get()),
                UserId::new(member.get()),
                DiscordRoleId::new(role.get()),
                Some(GRANT_REASON),
            )
            .await
            .map_err(map_platform_error)
    }

    async fn revoke_role(
        &self,
        community: CommunityId,
        member: MemberId,
        role: RoleId,
    ) -> Result<(), GatewayError> {
        self.http
            .remove_member_role(
                GuildId::new(community.get()),
                UserId::new(member.get()),
                DiscordRoleId::new(role.get()),
                Some(REVOKE_REASON),
            )
            .await
            .map_err(map_platform_error)
    }
}
