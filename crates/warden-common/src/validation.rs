//! Scope validation for permission queries.
//!
//! A member, guild, and channel only make sense together when they all belong to the
//! same guild. These checks are caller contracts: a failure is fatal for the query.

use uuid::Uuid;

use crate::error::WardenError;
use crate::models::{GuildChannel, Member};

/// Ensure `member` belongs to the guild identified by `guild_id`.
pub fn validate_member_scope(member: &Member, guild_id: Uuid) -> Result<(), WardenError> {
    if member.guild_id != guild_id {
        return Err(WardenError::Validation {
            message: format!(
                "Member {} belongs to guild {}, not guild {guild_id}",
                member.user_id, member.guild_id
            ),
        });
    }
    Ok(())
}

/// Ensure `channel` belongs to the guild identified by `guild_id`.
pub fn validate_channel_scope(channel: &GuildChannel, guild_id: Uuid) -> Result<(), WardenError> {
    if channel.guild_id != guild_id {
        return Err(WardenError::Validation {
            message: format!(
                "Channel {} belongs to guild {}, not guild {guild_id}",
                channel.id, channel.guild_id
            ),
        });
    }
    Ok(())
}
