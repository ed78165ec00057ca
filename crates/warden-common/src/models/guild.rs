//! Guild model: the community container.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// A guild snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: Uuid,

    #[serde(default)]
    pub name: String,

    /// Owner user ID. Owners implicitly hold every permission.
    pub owner_id: Uuid,

    /// Roles keyed by id. Filled in when the guild comes from a remote fetch; cached
    /// guild snapshots usually leave this empty and keep roles in a separate view.
    #[serde(default, with = "role_list")]
    pub roles: HashMap<Uuid, Role>,
}

impl Guild {
    pub fn new(id: Uuid, owner_id: Uuid) -> Self {
        Self { id, name: String::new(), owner_id, roles: HashMap::new() }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles.extend(roles.into_iter().map(|r| (r.id, r)));
        self
    }

    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

/// Roles travel as a list on the wire and are keyed by id in memory.
mod role_list {
    use std::collections::HashMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use uuid::Uuid;

    use crate::models::Role;

    pub fn serialize<S: Serializer>(roles: &HashMap<Uuid, Role>, s: S) -> Result<S::Ok, S::Error> {
        let mut list: Vec<&Role> = roles.values().collect();
        list.sort_by_key(|r| (r.position, r.id));
        list.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<HashMap<Uuid, Role>, D::Error> {
        let list = Vec::<Role>::deserialize(d)?;
        Ok(list.into_iter().map(|r| (r.id, r)).collect())
    }
}
