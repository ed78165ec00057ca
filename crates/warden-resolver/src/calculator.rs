//! Pure permission math.
//!
//! Resolution order for a member:
//! 1. Guild owner has all permissions
//! 2. Start with the everyone role, OR in every other role the member holds
//! 3. ADMINISTRATOR returns all permissions, channel overwrites are never consulted
//! 4. With a channel: everyone overwrite, then the merged role overwrites, then the
//!    member overwrite, each removing denied bits before adding allowed ones
//!
//! The layer order follows the platform's permission hierarchy. Swapping layers changes
//! results.

use std::collections::HashMap;

use uuid::Uuid;
use warden_common::models::{Guild, GuildChannel, Member, Role};
use warden_common::validation::{validate_channel_scope, validate_member_scope};
use warden_common::{ALL_PERMISSIONS, Permissions, WardenError, WardenResult};

/// Fold a member's roles into one base permission set.
///
/// `roles` must contain the everyone role (keyed by the member's guild id). Role ids the
/// member holds that are missing from `roles` are skipped.
pub fn calculate_role_permissions(
    roles: &HashMap<Uuid, Role>,
    member: &Member,
) -> WardenResult<Permissions> {
    let everyone = roles
        .get(&member.guild_id)
        .ok_or(WardenError::MissingEveryoneRole { guild_id: member.guild_id })?;

    Ok(member
        .role_ids
        .iter()
        .filter_map(|id| roles.get(id))
        .filter(|role| role.id != member.guild_id)
        .fold(everyone.permissions, |acc, role| acc.combine(role.permissions)))
}

/// Refine `permissions` with a channel's overwrites for `member`.
pub fn calculate_channel_overwrites(
    channel: &GuildChannel,
    member: &Member,
    permissions: Permissions,
) -> Permissions {
    let mut perms = permissions;

    // @everyone
    if let Some(ow) = channel.overwrite_for(member.guild_id) {
        perms = perms.apply_overwrite(ow.deny, ow.allow);
    }

    // Roles are merged first so their relative order never matters. A listed everyone id
    // takes part here like any other held role.
    let (deny, allow) = member
        .role_ids
        .iter()
        .filter_map(|id| channel.overwrite_for(*id))
        .fold((Permissions::empty(), Permissions::empty()), |(deny, allow), ow| {
            (deny.combine(ow.deny), allow.combine(ow.allow))
        });
    perms = perms.apply_overwrite(deny, allow);

    // Member-specific overwrite (highest priority)
    if let Some(ow) = channel.overwrite_for(member.user_id) {
        perms = perms.apply_overwrite(ow.deny, ow.allow);
    }

    perms
}

/// Calculate the permissions `member` has within `guild`, or within `channel` when given.
///
/// Fails with [`WardenError::Validation`] if the member or channel belongs to another
/// guild, and with [`WardenError::MissingEveryoneRole`] if `roles` lacks the everyone role
/// (only consulted when the member is not the owner).
pub fn calculate_permissions(
    member: &Member,
    guild: &Guild,
    roles: &HashMap<Uuid, Role>,
    channel: Option<&GuildChannel>,
) -> WardenResult<Permissions> {
    validate_member_scope(member, guild.id)?;
    if let Some(channel) = channel {
        validate_channel_scope(channel, guild.id)?;
    }

    // Guild owners are implicitly admins.
    if guild.is_owner(member.user_id) {
        return Ok(ALL_PERMISSIONS);
    }

    let permissions = calculate_role_permissions(roles, member)?;

    // Administrator is only grantable through roles and overrides every overwrite.
    if permissions.is_admin() {
        return Ok(ALL_PERMISSIONS);
    }

    Ok(match channel {
        Some(channel) => calculate_channel_overwrites(channel, member, permissions),
        None => permissions,
    })
}

/// Calculate the permissions granted by a guild's everyone role alone.
///
/// With a channel, only the everyone overwrite applies.
pub fn calculate_everyone_permissions(
    everyone_role: &Role,
    channel: Option<&GuildChannel>,
) -> WardenResult<Permissions> {
    let guild_id = everyone_role.guild_id;
    if let Some(channel) = channel {
        validate_channel_scope(channel, guild_id)?;
    }

    let permissions = everyone_role.permissions;
    if permissions.is_admin() {
        return Ok(ALL_PERMISSIONS);
    }

    Ok(match channel.and_then(|c| c.overwrite_for(guild_id)) {
        Some(ow) => permissions.apply_overwrite(ow.deny, ow.allow),
        None => permissions,
    })
}
