//! Permission flags and the bitmask algebra used to compose them.
//!
//! The flag universe is closed: every bit is declared below and no two flags share a bit.
//! Values are never mutated in place by the resolvers, every operation returns a new set.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

bitflags! {
    /// Guild-level and channel-level permissions.
    ///
    /// Roles combine permissions via OR. Channel overwrites remove denied bits and then
    /// add allowed bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Permissions: u64 {
        // === General ===
        /// Create invite links
        const CREATE_INSTANT_INVITE         = 1 << 0;
        /// Kick members
        const KICK_MEMBERS                  = 1 << 1;
        /// Ban members
        const BAN_MEMBERS                   = 1 << 2;
        /// Implies every other permission and bypasses channel overwrites
        const ADMINISTRATOR                 = 1 << 3;
        /// Create, edit, and delete channels
        const MANAGE_CHANNELS               = 1 << 4;
        /// Edit guild settings
        const MANAGE_GUILD                  = 1 << 5;
        /// Add reactions to messages
        const ADD_REACTIONS                 = 1 << 6;
        /// View the audit log
        const VIEW_AUDIT_LOG                = 1 << 7;

        // === Voice ===
        const PRIORITY_SPEAKER              = 1 << 8;
        const STREAM                        = 1 << 9;

        // === Text ===
        /// See a channel and read its messages
        const VIEW_CHANNEL                  = 1 << 10;
        const SEND_MESSAGES                 = 1 << 11;
        const SEND_TTS_MESSAGES             = 1 << 12;
        /// Delete or pin other members' messages
        const MANAGE_MESSAGES               = 1 << 13;
        const EMBED_LINKS                   = 1 << 14;
        const ATTACH_FILES                  = 1 << 15;
        const READ_MESSAGE_HISTORY          = 1 << 16;
        /// Mention @everyone and @here
        const MENTION_EVERYONE              = 1 << 17;
        const USE_EXTERNAL_EMOJIS           = 1 << 18;
        const VIEW_GUILD_INSIGHTS           = 1 << 19;

        // === Voice ===
        const CONNECT                       = 1 << 20;
        const SPEAK                         = 1 << 21;
        const MUTE_MEMBERS                  = 1 << 22;
        const DEAFEN_MEMBERS                = 1 << 23;
        const MOVE_MEMBERS                  = 1 << 24;
        /// Use voice activity detection (vs push-to-talk only)
        const USE_VAD                       = 1 << 25;

        // === Membership ===
        const CHANGE_NICKNAME               = 1 << 26;
        const MANAGE_NICKNAMES              = 1 << 27;
        /// Manage roles below your highest role
        const MANAGE_ROLES                  = 1 << 28;
        const MANAGE_WEBHOOKS               = 1 << 29;
        const MANAGE_EMOJIS_AND_STICKERS    = 1 << 30;
        const USE_APPLICATION_COMMANDS      = 1 << 31;
        const REQUEST_TO_SPEAK              = 1 << 32;
        const MANAGE_EVENTS                 = 1 << 33;

        // === Threads ===
        const MANAGE_THREADS                = 1 << 34;
        const CREATE_PUBLIC_THREADS         = 1 << 35;
        const CREATE_PRIVATE_THREADS        = 1 << 36;
        const USE_EXTERNAL_STICKERS         = 1 << 37;
        const SEND_MESSAGES_IN_THREADS      = 1 << 38;

        // === Misc ===
        const USE_EMBEDDED_ACTIVITIES       = 1 << 39;
        /// Time out members
        const MODERATE_MEMBERS              = 1 << 40;
        const VIEW_CREATOR_MONETIZATION_ANALYTICS = 1 << 41;
        const USE_SOUNDBOARD                = 1 << 42;
        const USE_EXTERNAL_SOUNDS           = 1 << 45;
        const SEND_VOICE_MESSAGES           = 1 << 46;
    }
}

/// Every known permission, i.e. each declared flag combined exactly once.
pub const ALL_PERMISSIONS: Permissions = Permissions::all();

impl Permissions {
    /// Union of both sets.
    #[must_use]
    pub const fn combine(self, other: Permissions) -> Self {
        self.union(other)
    }

    /// `self` with every bit of `other` cleared.
    #[must_use]
    pub const fn without(self, other: Permissions) -> Self {
        self.difference(other)
    }

    /// Apply one overwrite layer: denied bits are removed first, then allowed bits are added.
    #[must_use]
    pub const fn apply_overwrite(self, deny: Permissions, allow: Permissions) -> Self {
        self.without(deny).combine(allow)
    }

    /// Check if administrator (overrides all other checks).
    pub const fn is_admin(&self) -> bool {
        self.contains(Self::ADMINISTRATOR)
    }

    /// Check if a holder of these permissions can perform an action.
    pub const fn has(&self, required: Permissions) -> bool {
        self.is_admin() || self.contains(required)
    }

    /// The bits of `required` that are not held. Empty for administrators.
    #[must_use]
    pub const fn missing(&self, required: Permissions) -> Permissions {
        if self.is_admin() {
            Permissions::empty()
        } else {
            required.without(*self)
        }
    }
}

/// Channel-level permission overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    /// The role or user ID this overwrite applies to
    pub id: Uuid,
    /// Whether this targets a role or a member
    #[serde(rename = "type")]
    pub kind: OverwriteType,
    /// Permissions explicitly allowed
    #[serde(default = "Permissions::empty")]
    pub allow: Permissions,
    /// Permissions explicitly denied
    #[serde(default = "Permissions::empty")]
    pub deny: Permissions,
}

impl PermissionOverwrite {
    pub fn new(id: Uuid, kind: OverwriteType) -> Self {
        Self { id, kind, allow: Permissions::empty(), deny: Permissions::empty() }
    }

    pub fn allow(mut self, allow: Permissions) -> Self {
        self.allow = allow;
        self
    }

    pub fn deny(mut self, deny: Permissions) -> Self {
        self.deny = deny;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwriteType {
    Role,
    Member,
}
