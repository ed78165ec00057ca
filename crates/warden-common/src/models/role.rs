//! Role model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permissions::Permissions;

/// A role within a guild.
///
/// Every guild has exactly one role whose `id` equals the guild's id: the implicit
/// "everyone" role held by all members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub guild_id: Uuid,

    /// Role name
    #[serde(default)]
    pub name: String,

    /// Position in the role hierarchy (higher = more power)
    #[serde(default)]
    pub position: i32,

    /// Permission bitfield
    pub permissions: Permissions,
}

impl Role {
    pub fn new(id: Uuid, guild_id: Uuid, permissions: Permissions) -> Self {
        Self { id, guild_id, name: String::new(), position: 0, permissions }
    }

    /// The implicit role held by every member of `guild_id`.
    pub fn everyone(guild_id: Uuid, permissions: Permissions) -> Self {
        Self { name: "@everyone".to_owned(), ..Self::new(guild_id, guild_id, permissions) }
    }

    /// Whether this is the guild's everyone role.
    pub fn is_everyone(&self) -> bool {
        self.id == self.guild_id
    }
}
