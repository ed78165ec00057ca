//! In-memory resource cache.
//!
//! Backed by `DashMap`s for lock-free concurrent reads. Population is left to whoever
//! owns the cache (an event consumer, a snapshot loader); the fetcher never writes here.

use std::collections::HashMap;

use dashmap::DashMap;
use uuid::Uuid;
use warden_common::models::{Guild, GuildChannel, Role};

use crate::source::ResourceCache;

/// Thread-safe cache of guild snapshots.
#[derive(Debug, Default)]
pub struct MemoryCache {
    guilds: DashMap<Uuid, Guild>,
    roles: DashMap<Uuid, Role>,
    channels: DashMap<Uuid, GuildChannel>,
}

impl MemoryCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache a guild. Roles embedded in the guild are moved into the role view.
    pub fn insert_guild(&self, mut guild: Guild) {
        for (_, role) in guild.roles.drain() {
            self.insert_role(role);
        }
        self.guilds.insert(guild.id, guild);
    }

    pub fn insert_role(&self, role: Role) {
        self.roles.insert(role.id, role);
    }

    pub fn insert_channel(&self, channel: GuildChannel) {
        self.channels.insert(channel.id, channel);
    }

    /// Drop a guild along with its roles and channels.
    pub fn remove_guild(&self, guild_id: Uuid) {
        self.guilds.remove(&guild_id);
        self.roles.retain(|_, r| r.guild_id != guild_id);
        self.channels.retain(|_, c| c.guild_id != guild_id);
    }

    pub fn remove_role(&self, role_id: Uuid) {
        self.roles.remove(&role_id);
    }

    pub fn remove_channel(&self, channel_id: Uuid) {
        self.channels.remove(&channel_id);
    }
}

impl ResourceCache for MemoryCache {
    fn get_guild(&self, guild_id: Uuid) -> Option<Guild> {
        self.guilds.get(&guild_id).map(|g| g.clone())
    }

    fn get_roles_view_for_guild(&self, guild_id: Uuid) -> Option<HashMap<Uuid, Role>> {
        let view: HashMap<Uuid, Role> = self
            .roles
            .iter()
            .filter(|r| r.guild_id == guild_id)
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        (!view.is_empty()).then_some(view)
    }

    fn get_guild_channel(&self, channel_id: Uuid) -> Option<GuildChannel> {
        self.channels.get(&channel_id).map(|c| c.clone())
    }
}
