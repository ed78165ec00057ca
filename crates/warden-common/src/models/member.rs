//! Member model: a user's membership in a specific guild.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a user's membership in a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: Uuid,
    pub guild_id: Uuid,

    /// Guild-specific nickname
    #[serde(default)]
    pub nickname: Option<String>,

    /// Role IDs assigned to this member. The everyone role is implicit and may or may
    /// not be listed.
    #[serde(default)]
    pub role_ids: Vec<Uuid>,
}

impl Member {
    pub fn new(user_id: Uuid, guild_id: Uuid) -> Self {
        Self { user_id, guild_id, nickname: None, role_ids: Vec::new() }
    }

    pub fn with_roles(mut self, role_ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.role_ids.extend(role_ids);
        self
    }
}
