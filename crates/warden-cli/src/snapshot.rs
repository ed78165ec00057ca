//! Snapshot files: a frozen view of guilds, roles, members, and channels.
//!
//! The same snapshot backs both collaborators: [`Snapshot::to_cache`] fills an in-memory
//! cache, and [`SnapshotDirectory`] answers remote fetches so `--no-cache` runs exercise
//! the retry path against identical data.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;
use warden_common::models::{Channel, Guild, Member, Role};
use warden_common::{WardenError, WardenResult};
use warden_resolver::{MemoryCache, ResourceDirectory};

#[derive(Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub guilds: Vec<Guild>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl Snapshot {
    /// Read a snapshot file. `.toml` files are parsed as TOML, anything else as JSON.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        let is_toml = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let snapshot = if is_toml {
            toml::from_str(&raw)
                .with_context(|| format!("parsing TOML snapshot {}", path.display()))?
        } else {
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing JSON snapshot {}", path.display()))?
        };
        Ok(snapshot)
    }

    pub fn member(&self, guild_id: Uuid, user_id: Uuid) -> Option<&Member> {
        self.members.iter().find(|m| m.guild_id == guild_id && m.user_id == user_id)
    }

    /// Every role of `guild_id`, whether listed at the top level or embedded in the guild.
    fn roles_of(&self, guild_id: Uuid) -> Vec<Role> {
        let embedded = self
            .guilds
            .iter()
            .filter(|g| g.id == guild_id)
            .flat_map(|g| g.roles.values());
        self.roles
            .iter()
            .filter(|r| r.guild_id == guild_id)
            .chain(embedded)
            .cloned()
            .collect()
    }

    pub fn to_cache(&self) -> MemoryCache {
        let cache = MemoryCache::new();
        for guild in &self.guilds {
            cache.insert_guild(guild.clone());
        }
        for role in &self.roles {
            cache.insert_role(role.clone());
        }
        for channel in &self.channels {
            if let Channel::Guild(channel) = channel {
                cache.insert_channel(channel.clone());
            }
        }
        cache
    }
}

/// Serves remote fetches out of a snapshot.
pub struct SnapshotDirectory {
    snapshot: Arc<Snapshot>,
}

impl SnapshotDirectory {
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl ResourceDirectory for SnapshotDirectory {
    async fn fetch_guild(&self, guild_id: Uuid) -> WardenResult<Guild> {
        let guild = self
            .snapshot
            .guilds
            .iter()
            .find(|g| g.id == guild_id)
            .ok_or_else(|| WardenError::NotFound { resource: format!("Guild {guild_id}") })?;
        Ok(guild.clone().with_roles(self.snapshot.roles_of(guild_id)))
    }

    async fn fetch_roles(&self, guild_id: Uuid) -> WardenResult<Vec<Role>> {
        Ok(self.snapshot.roles_of(guild_id))
    }

    async fn fetch_channel(&self, channel_id: Uuid) -> WardenResult<Channel> {
        self.snapshot
            .channels
            .iter()
            .find(|c| c.id() == channel_id)
            .cloned()
            .ok_or_else(|| WardenError::NotFound { resource: format!("Channel {channel_id}") })
    }
}

#[cfg(test)]
mod tests {
    use warden_common::Permissions;
    use warden_resolver::ResourceCache;

    use super::*;

    const GUILD: &str = "0190a2b4-0000-7000-8000-000000000001";
    const OWNER: &str = "0190a2b4-0000-7000-8000-0000000000aa";
    const USER: &str = "0190a2b4-0000-7000-8000-0000000000bb";
    const CHANNEL: &str = "0190a2b4-0000-7000-8000-0000000000cc";

    fn toml_snapshot() -> Snapshot {
        let raw = format!(
            r#"
            [[guilds]]
            id = "{GUILD}"
            owner_id = "{OWNER}"

            [[roles]]
            id = "{GUILD}"
            guild_id = "{GUILD}"
            permissions = "VIEW_CHANNEL | SEND_MESSAGES"

            [[members]]
            user_id = "{USER}"
            guild_id = "{GUILD}"

            [[channels]]
            scope = "guild"
            id = "{CHANNEL}"
            guild_id = "{GUILD}"

            [[channels.permission_overwrites]]
            id = "{GUILD}"
            type = "role"
            deny = "SEND_MESSAGES"
            "#
        );
        toml::from_str(&raw).expect("valid snapshot")
    }

    fn id(raw: &str) -> Uuid {
        raw.parse().expect("valid uuid")
    }

    #[test]
    fn test_toml_snapshot_fills_cache() {
        let cache = toml_snapshot().to_cache();
        assert!(cache.get_guild(id(GUILD)).is_some());
        let roles = cache.get_roles_view_for_guild(id(GUILD)).expect("roles");
        assert_eq!(
            roles[&id(GUILD)].permissions,
            Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES
        );
        let channel = cache.get_guild_channel(id(CHANNEL)).expect("channel");
        let everyone = channel.overwrite_for(id(GUILD)).expect("everyone overwrite");
        assert_eq!(everyone.deny, Permissions::SEND_MESSAGES);
    }

    #[test]
    fn test_member_lookup() {
        let snapshot = toml_snapshot();
        assert!(snapshot.member(id(GUILD), id(USER)).is_some());
        assert!(snapshot.member(id(GUILD), id(OWNER)).is_none());
    }

    #[tokio::test]
    async fn test_directory_attaches_roles_to_guild() {
        let directory = SnapshotDirectory::new(Arc::new(toml_snapshot()));
        let guild = directory.fetch_guild(id(GUILD)).await.expect("guild");
        assert!(guild.roles.contains_key(&id(GUILD)));

        let err = directory.fetch_channel(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, WardenError::NotFound { .. }));
    }
}
