//! Cache-first permission fetching.
//!
//! Resolves the guild, its roles, and optionally a channel, preferring the cache at every
//! step and falling back to the remote directory under the retry driver. Owner and
//! administrator short-circuits are applied as early as possible so that no role or
//! channel request is made when its answer cannot change the result.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;
use warden_common::config::RetryConfig;
use warden_common::models::{ChannelTarget, Guild, GuildChannel, Member, Role};
use warden_common::validation::validate_channel_scope;
use warden_common::{ALL_PERMISSIONS, Permissions, WardenError, WardenResult};

use crate::backoff::Backoff;
use crate::calculator::{
    calculate_channel_overwrites, calculate_everyone_permissions, calculate_role_permissions,
};
use crate::source::{ResourceCache, ResourceDirectory, Resolved, resolve};

/// Resolves effective permissions against a cache and a remote directory.
#[derive(Clone)]
pub struct PermissionFetcher {
    cache: Option<Arc<dyn ResourceCache>>,
    directory: Arc<dyn ResourceDirectory>,
    backoff: Backoff,
}

impl PermissionFetcher {
    /// Create a fetcher with the default retry policy.
    pub fn new(
        cache: Option<Arc<dyn ResourceCache>>,
        directory: Arc<dyn ResourceDirectory>,
    ) -> Self {
        Self { cache, directory, backoff: Backoff::default() }
    }

    pub fn with_retry_config(mut self, config: &RetryConfig) -> Self {
        self.backoff = Backoff::from_config(config);
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Calculate the permissions `member` has in its guild, or in `channel` when given.
    #[tracing::instrument(skip_all, fields(guild_id = %member.guild_id, user_id = %member.user_id))]
    pub async fn fetch_permissions(
        &self,
        member: &Member,
        channel: Option<ChannelTarget>,
    ) -> WardenResult<Permissions> {
        let guild = self.resolve_guild(member.guild_id).await?;
        // A fetched guild payload already carries its roles.
        let (guild, roles) = match guild {
            Resolved::Fetched(mut guild) if !guild.roles.is_empty() => {
                let roles = std::mem::take(&mut guild.roles);
                (guild, Some(roles))
            }
            other => (other.into_inner(), None),
        };

        // Guild owners are implicitly admins.
        if guild.is_owner(member.user_id) {
            debug!("member owns the guild");
            return Ok(ALL_PERMISSIONS);
        }

        let roles = match roles {
            Some(roles) => roles,
            None => self.resolve_roles(guild.id).await?,
        };

        let permissions = calculate_role_permissions(&roles, member)?;
        // Administrator overrides all overwrites and is only grantable through roles.
        if permissions.is_admin() {
            debug!("member holds administrator");
            return Ok(ALL_PERMISSIONS);
        }

        let Some(target) = channel else {
            return Ok(permissions);
        };

        let channel = self.resolve_channel(target, guild.id).await?;
        Ok(calculate_channel_overwrites(&channel, member, permissions))
    }

    /// Calculate the permissions of `guild_id`'s everyone role, optionally in `channel`.
    #[tracing::instrument(skip_all, fields(guild_id = %guild_id))]
    pub async fn fetch_everyone_permissions(
        &self,
        guild_id: Uuid,
        channel: Option<ChannelTarget>,
    ) -> WardenResult<Permissions> {
        let cached = self
            .cache
            .as_ref()
            .and_then(|c| c.get_roles_view_for_guild(guild_id))
            .and_then(|mut roles| roles.remove(&guild_id));

        let everyone = match cached {
            Some(role) => role,
            None => {
                debug!("everyone role cache miss");
                self.backoff
                    .run(|| self.directory.fetch_roles(guild_id))
                    .await?
                    .into_iter()
                    .find(Role::is_everyone)
                    .ok_or(WardenError::MissingEveryoneRole { guild_id })?
            }
        };

        let channel = match channel {
            Some(target) => Some(self.resolve_channel(target, guild_id).await?),
            None => None,
        };
        calculate_everyone_permissions(&everyone, channel.as_ref())
    }

    async fn resolve_guild(&self, guild_id: Uuid) -> WardenResult<Resolved<Guild>> {
        let cached = self.cache.as_ref().and_then(|c| c.get_guild(guild_id));
        if cached.is_none() {
            debug!("guild cache miss");
        }
        resolve(cached, || self.backoff.run(|| self.directory.fetch_guild(guild_id))).await
    }

    async fn resolve_roles(&self, guild_id: Uuid) -> WardenResult<HashMap<Uuid, Role>> {
        // An empty view is treated as a miss: a guild always has at least its everyone role.
        let cached = self
            .cache
            .as_ref()
            .and_then(|c| c.get_roles_view_for_guild(guild_id))
            .filter(|roles| !roles.is_empty());
        if cached.is_none() {
            debug!("roles cache miss");
        }
        let resolved = resolve(cached, || async {
            let roles = self.backoff.run(|| self.directory.fetch_roles(guild_id)).await?;
            Ok::<_, WardenError>(roles.into_iter().map(|r| (r.id, r)).collect())
        })
        .await?;
        Ok(resolved.into_inner())
    }

    /// Resolve `target` and check it belongs to `guild_id`.
    async fn resolve_channel(
        &self,
        target: ChannelTarget,
        guild_id: Uuid,
    ) -> WardenResult<GuildChannel> {
        let channel = match target {
            ChannelTarget::Channel(channel) => channel,
            ChannelTarget::Id(channel_id) => {
                let cached = self.cache.as_ref().and_then(|c| c.get_guild_channel(channel_id));
                if cached.is_none() {
                    debug!(%channel_id, "channel cache miss");
                }
                resolve(cached, || async {
                    self.backoff
                        .run(|| self.directory.fetch_channel(channel_id))
                        .await?
                        .into_guild_channel()
                })
                .await?
                .into_inner()
            }
        };

        validate_channel_scope(&channel, guild_id)?;
        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use warden_common::models::{Channel, DmChannel};
    use warden_common::permissions::{OverwriteType, PermissionOverwrite};

    use super::*;
    use crate::backoff::rate_limited;
    use crate::cache::MemoryCache;

    /// Remote directory backed by fixed data, with scripted failures and call counts.
    #[derive(Default)]
    struct FakeDirectory {
        guilds: HashMap<Uuid, Guild>,
        roles: Vec<Role>,
        channels: HashMap<Uuid, Channel>,
        failures: Mutex<VecDeque<WardenError>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeDirectory {
        fn record(&self, call: &'static str) -> WardenResult<()> {
            self.calls.lock().unwrap().push(call);
            match self.failures.lock().unwrap().pop_front() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResourceDirectory for FakeDirectory {
        async fn fetch_guild(&self, guild_id: Uuid) -> WardenResult<Guild> {
            self.record("guild")?;
            self.guilds
                .get(&guild_id)
                .cloned()
                .ok_or(WardenError::NotFound { resource: "Guild".into() })
        }

        async fn fetch_roles(&self, guild_id: Uuid) -> WardenResult<Vec<Role>> {
            self.record("roles")?;
            Ok(self.roles.iter().filter(|r| r.guild_id == guild_id).cloned().collect())
        }

        async fn fetch_channel(&self, channel_id: Uuid) -> WardenResult<Channel> {
            self.record("channel")?;
            self.channels
                .get(&channel_id)
                .cloned()
                .ok_or(WardenError::NotFound { resource: "Channel".into() })
        }
    }

    struct World {
        guild: Guild,
        everyone: Role,
        member: Member,
        channel: GuildChannel,
    }

    fn world(everyone: Permissions) -> World {
        let guild_id = Uuid::now_v7();
        let everyone = Role::everyone(guild_id, everyone);
        let guild = Guild::new(guild_id, Uuid::now_v7());
        let member = Member::new(Uuid::now_v7(), guild_id);
        let channel = GuildChannel::new(Uuid::now_v7(), guild_id);
        World { guild, everyone, member, channel }
    }

    impl World {
        fn remote(&self) -> FakeDirectory {
            FakeDirectory {
                guilds: HashMap::from([(
                    self.guild.id,
                    self.guild.clone().with_roles([self.everyone.clone()]),
                )]),
                roles: vec![self.everyone.clone()],
                channels: HashMap::from([(self.channel.id, self.channel.clone().into())]),
                ..Default::default()
            }
        }

        fn cache(&self) -> MemoryCache {
            let cache = MemoryCache::new();
            cache.insert_guild(self.guild.clone());
            cache.insert_role(self.everyone.clone());
            cache.insert_channel(self.channel.clone());
            cache
        }
    }

    fn fetcher(cache: Option<MemoryCache>, remote: &Arc<FakeDirectory>) -> PermissionFetcher {
        let cache = cache.map(|c| Arc::new(c) as Arc<dyn ResourceCache>);
        PermissionFetcher::new(cache, remote.clone())
    }

    #[tokio::test]
    async fn test_fully_cached_query_makes_no_remote_calls() {
        let w = world(Permissions::VIEW_CHANNEL);
        let remote = Arc::new(w.remote());
        let perms = fetcher(Some(w.cache()), &remote)
            .fetch_permissions(&w.member, Some(w.channel.id.into()))
            .await
            .expect("perms");

        assert_eq!(perms, Permissions::VIEW_CHANNEL);
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_cache_uses_roles_from_guild_payload() {
        let w = world(Permissions::VIEW_CHANNEL);
        let remote = Arc::new(w.remote());
        let perms = fetcher(None, &remote)
            .fetch_permissions(&w.member, Some(w.channel.id.into()))
            .await
            .expect("perms");

        assert_eq!(perms, Permissions::VIEW_CHANNEL);
        assert_eq!(remote.calls(), vec!["guild", "channel"]);
    }

    #[tokio::test]
    async fn test_guild_payload_without_roles_falls_back_to_fetch_roles() {
        let w = world(Permissions::VIEW_CHANNEL);
        let mut remote = w.remote();
        remote.guilds.insert(w.guild.id, w.guild.clone());
        let remote = Arc::new(remote);

        let perms = fetcher(None, &remote).fetch_permissions(&w.member, None).await.expect("perms");

        assert_eq!(perms, Permissions::VIEW_CHANNEL);
        assert_eq!(remote.calls(), vec!["guild", "roles"]);
    }

    #[tokio::test]
    async fn test_cached_guild_without_cached_roles_fetches_roles() {
        let w = world(Permissions::SEND_MESSAGES);
        let cache = MemoryCache::new();
        cache.insert_guild(w.guild.clone());
        let remote = Arc::new(w.remote());

        let perms = fetcher(Some(cache), &remote)
            .fetch_permissions(&w.member, None)
            .await
            .expect("perms");

        assert_eq!(perms, Permissions::SEND_MESSAGES);
        assert_eq!(remote.calls(), vec!["roles"]);
    }

    /// A cache that knows the guild but reports an empty role view.
    struct EmptyRolesCache {
        guild: Guild,
    }

    impl ResourceCache for EmptyRolesCache {
        fn get_guild(&self, guild_id: Uuid) -> Option<Guild> {
            (guild_id == self.guild.id).then(|| self.guild.clone())
        }

        fn get_roles_view_for_guild(&self, _guild_id: Uuid) -> Option<HashMap<Uuid, Role>> {
            Some(HashMap::new())
        }

        fn get_guild_channel(&self, _channel_id: Uuid) -> Option<GuildChannel> {
            None
        }
    }

    #[tokio::test]
    async fn test_empty_cached_role_view_falls_back_to_fetch_roles() {
        let w = world(Permissions::VIEW_CHANNEL);
        let cache: Arc<dyn ResourceCache> = Arc::new(EmptyRolesCache { guild: w.guild.clone() });
        let remote = Arc::new(w.remote());

        let perms = PermissionFetcher::new(Some(cache), remote.clone())
            .fetch_permissions(&w.member, None)
            .await
            .expect("perms");

        assert_eq!(perms, Permissions::VIEW_CHANNEL);
        assert_eq!(remote.calls(), vec!["roles"]);
    }

    #[tokio::test]
    async fn test_owner_short_circuits_before_roles_and_channel() {
        let mut w = world(Permissions::empty());
        w.guild.owner_id = w.member.user_id;
        let cache = MemoryCache::new();
        cache.insert_guild(w.guild.clone());
        let remote = Arc::new(w.remote());

        let perms = fetcher(Some(cache), &remote)
            .fetch_permissions(&w.member, Some(Uuid::now_v7().into()))
            .await
            .expect("perms");

        assert_eq!(perms, ALL_PERMISSIONS);
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_admin_short_circuits_before_channel() {
        let mut w = world(Permissions::VIEW_CHANNEL);
        let admin = Role::new(Uuid::now_v7(), w.guild.id, Permissions::ADMINISTRATOR);
        w.member.role_ids.push(admin.id);
        let cache = w.cache();
        cache.insert_role(admin);
        let remote = Arc::new(w.remote());

        let perms = fetcher(Some(cache), &remote)
            .fetch_permissions(&w.member, Some(Uuid::now_v7().into()))
            .await
            .expect("perms");

        assert_eq!(perms, ALL_PERMISSIONS);
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_channel_object_is_used_as_is() {
        let w = world(Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES);
        let channel = w.channel.clone().with_overwrite(
            PermissionOverwrite::new(w.member.user_id, OverwriteType::Member)
                .deny(Permissions::SEND_MESSAGES),
        );
        let remote = Arc::new(w.remote());

        let perms = fetcher(Some(w.cache()), &remote)
            .fetch_permissions(&w.member, Some(channel.into()))
            .await
            .expect("perms");

        assert_eq!(perms, Permissions::VIEW_CHANNEL);
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dm_channel_is_rejected() {
        let w = world(Permissions::VIEW_CHANNEL);
        let dm_id = Uuid::now_v7();
        let mut remote = w.remote();
        let dm = Channel::Dm(DmChannel { id: dm_id, recipient_ids: vec![] });
        remote.channels.insert(dm_id, dm);
        let remote = Arc::new(remote);

        let err = fetcher(Some(w.cache()), &remote)
            .fetch_permissions(&w.member, Some(dm_id.into()))
            .await
            .unwrap_err();

        assert!(matches!(err, WardenError::Validation { .. }));
        assert_eq!(remote.calls(), vec!["channel"]);
    }

    #[tokio::test]
    async fn test_channel_from_other_guild_is_rejected() {
        let w = world(Permissions::VIEW_CHANNEL);
        let foreign = GuildChannel::new(Uuid::now_v7(), Uuid::now_v7());
        let remote = Arc::new(w.remote());

        let err = fetcher(Some(w.cache()), &remote)
            .fetch_permissions(&w.member, Some(foreign.into()))
            .await
            .unwrap_err();

        assert!(matches!(err, WardenError::Validation { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_failures_are_retried() {
        let w = world(Permissions::VIEW_CHANNEL);
        let remote = w.remote();
        remote.failures.lock().unwrap().extend([
            rate_limited(Duration::from_secs(1)),
            WardenError::TransientServer { status: 502, message: "bad gateway".into() },
        ]);
        let remote = Arc::new(remote);

        let perms = fetcher(None, &remote).fetch_permissions(&w.member, None).await.expect("perms");

        assert_eq!(perms, Permissions::VIEW_CHANNEL);
        assert_eq!(remote.calls(), vec!["guild", "guild", "guild"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_rate_limit_fails_the_query() {
        let w = world(Permissions::VIEW_CHANNEL);
        let remote = w.remote();
        remote.failures.lock().unwrap().push_back(rate_limited(Duration::from_secs(30)));
        let remote = Arc::new(remote);

        let err = fetcher(None, &remote).fetch_permissions(&w.member, None).await.unwrap_err();

        assert!(matches!(err, WardenError::RateLimited { .. }));
        assert_eq!(remote.calls(), vec!["guild"]);
    }

    #[tokio::test]
    async fn test_everyone_permissions_from_cache() {
        let w = world(Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES);
        let channel = w.channel.clone().with_overwrite(
            PermissionOverwrite::new(w.guild.id, OverwriteType::Role)
                .deny(Permissions::SEND_MESSAGES),
        );
        let remote = Arc::new(w.remote());

        let perms = fetcher(Some(w.cache()), &remote)
            .fetch_everyone_permissions(w.guild.id, Some(channel.into()))
            .await
            .expect("perms");

        assert_eq!(perms, Permissions::VIEW_CHANNEL);
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_everyone_permissions_without_cache() {
        let w = world(Permissions::VIEW_CHANNEL);
        let remote = Arc::new(w.remote());

        let perms = fetcher(None, &remote)
            .fetch_everyone_permissions(w.guild.id, Some(w.channel.id.into()))
            .await
            .expect("perms");

        assert_eq!(perms, Permissions::VIEW_CHANNEL);
        assert_eq!(remote.calls(), vec!["roles", "channel"]);
    }

    #[tokio::test]
    async fn test_everyone_permissions_missing_role() {
        let w = world(Permissions::VIEW_CHANNEL);
        let mut remote = w.remote();
        remote.roles.clear();
        let remote = Arc::new(remote);

        let err = fetcher(None, &remote)
            .fetch_everyone_permissions(w.guild.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WardenError::MissingEveryoneRole { .. }));
    }
}
