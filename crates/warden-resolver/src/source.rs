//! Collaborator contracts: a synchronous read-through cache and an async remote directory.
//!
//! The fetcher only reads through these traits, so tests can swap in deterministic fakes
//! for either side independently.

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use uuid::Uuid;
use warden_common::WardenResult;
use warden_common::models::{Channel, Guild, GuildChannel, Role};

/// Local snapshot cache. Lookups never suspend and never fail; a miss is `None`.
pub trait ResourceCache: Send + Sync {
    fn get_guild(&self, guild_id: Uuid) -> Option<Guild>;

    /// Every cached role of a guild, keyed by role id.
    fn get_roles_view_for_guild(&self, guild_id: Uuid) -> Option<HashMap<Uuid, Role>>;

    fn get_guild_channel(&self, channel_id: Uuid) -> Option<GuildChannel>;
}

/// The remote authority for guild resources.
///
/// Implementations report failures with the retry-relevant variants of
/// [`warden_common::WardenError`]: `RateLimited`, `TransientServer`, or a fatal one.
#[async_trait]
pub trait ResourceDirectory: Send + Sync {
    /// Fetch a guild, including its roles.
    async fn fetch_guild(&self, guild_id: Uuid) -> WardenResult<Guild>;

    async fn fetch_roles(&self, guild_id: Uuid) -> WardenResult<Vec<Role>>;

    /// Fetch any channel. May return a DM channel.
    async fn fetch_channel(&self, channel_id: Uuid) -> WardenResult<Channel>;
}

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<T> {
    Cached(T),
    Fetched(T),
}

impl<T> Resolved<T> {
    pub fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Cached(v) | Self::Fetched(v) => v,
        }
    }
}

/// Prefer `cached`, otherwise run `fetch`.
pub async fn resolve<T, F, Fut>(cached: Option<T>, fetch: F) -> WardenResult<Resolved<T>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = WardenResult<T>>,
{
    match cached {
        Some(value) => Ok(Resolved::Cached(value)),
        None => fetch().await.map(Resolved::Fetched),
    }
}
