//! Channel model: the sub-resource permissions can be scoped to.
//!
//! A remote fetch may hand back any kind of channel, including direct messages. Only
//! guild channels carry permission overwrites, so callers narrow a [`Channel`] with
//! [`Channel::into_guild_channel`] before resolving permissions against it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{WardenError, WardenResult};
use crate::permissions::PermissionOverwrite;

/// A channel within a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildChannel {
    pub id: Uuid,

    /// Guild this channel belongs to
    pub guild_id: Uuid,

    #[serde(default)]
    pub name: String,

    #[serde(default = "ChannelType::default_guild")]
    pub kind: ChannelType,

    /// Overwrites keyed by their subject (everyone-role, role, or user id)
    #[serde(default, with = "overwrite_list")]
    pub permission_overwrites: HashMap<Uuid, PermissionOverwrite>,
}

impl GuildChannel {
    pub fn new(id: Uuid, guild_id: Uuid) -> Self {
        Self {
            id,
            guild_id,
            name: String::new(),
            kind: ChannelType::Text,
            permission_overwrites: HashMap::new(),
        }
    }

    /// Add or replace the overwrite for its subject.
    pub fn with_overwrite(mut self, overwrite: PermissionOverwrite) -> Self {
        self.permission_overwrites.insert(overwrite.id, overwrite);
        self
    }

    pub fn overwrite_for(&self, subject_id: Uuid) -> Option<&PermissionOverwrite> {
        self.permission_overwrites.get(&subject_id)
    }
}

/// A direct message conversation. Carries no overwrites and belongs to no guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmChannel {
    pub id: Uuid,
    #[serde(default)]
    pub recipient_ids: Vec<Uuid>,
}

/// Any channel a remote directory can return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Channel {
    Guild(GuildChannel),
    Dm(DmChannel),
}

impl Channel {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Guild(c) => c.id,
            Self::Dm(c) => c.id,
        }
    }

    /// Narrow to a guild channel, rejecting direct messages.
    pub fn into_guild_channel(self) -> WardenResult<GuildChannel> {
        match self {
            Self::Guild(c) => Ok(c),
            Self::Dm(c) => Err(WardenError::Validation {
                message: format!("Channel {} is a DM channel, not a guild channel", c.id),
            }),
        }
    }
}

impl From<GuildChannel> for Channel {
    fn from(c: GuildChannel) -> Self {
        Self::Guild(c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Text,
    Voice,
    Category,
    Announcement,
    Thread,
    Forum,
    Stage,
}

impl ChannelType {
    fn default_guild() -> Self {
        Self::Text
    }
}

/// The channel a permission query is scoped to: either just its id, or an object the
/// caller already holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelTarget {
    Id(Uuid),
    Channel(GuildChannel),
}

impl ChannelTarget {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Id(id) => *id,
            Self::Channel(c) => c.id,
        }
    }
}

impl From<Uuid> for ChannelTarget {
    fn from(id: Uuid) -> Self {
        Self::Id(id)
    }
}

impl From<GuildChannel> for ChannelTarget {
    fn from(c: GuildChannel) -> Self {
        Self::Channel(c)
    }
}

/// Overwrites travel as a list on the wire and are keyed by subject in memory.
mod overwrite_list {
    use std::collections::HashMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use uuid::Uuid;

    use crate::permissions::PermissionOverwrite;

    pub fn serialize<S: Serializer>(
        overwrites: &HashMap<Uuid, PermissionOverwrite>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        let mut list: Vec<&PermissionOverwrite> = overwrites.values().collect();
        list.sort_by_key(|o| o.id);
        list.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<HashMap<Uuid, PermissionOverwrite>, D::Error> {
        let list = Vec::<PermissionOverwrite>::deserialize(d)?;
        Ok(list.into_iter().map(|o| (o.id, o)).collect())
    }
}
