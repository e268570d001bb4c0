//! Compound key used by component registries
//!
//! A key pairs an object id with an optional name. Equality is asymmetric:
//! when *both* keys carry a non-empty name, name and id must both match;
//! when either side is unnamed, only the ids are compared.
//! Hashing uses the id alone, which keeps `Hash` consistent with `Eq`.

use std::hash::{Hash, Hasher};

use crate::object::{ObjectId, ObjectIdentity};

/// Registry key of a component
#[derive(Debug, Clone)]
pub struct ComponentKey {
    id: ObjectId,
    name: String,
}

impl ComponentKey {
    /// Build a key from its parts
    pub fn new(id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Key of an object's current id and name
    pub fn of(identity: &ObjectIdentity) -> Self {
        Self::new(identity.id(), identity.name())
    }

    /// Unnamed lookup key; matches any key with the same id
    pub fn from_id(id: ObjectId) -> Self {
        Self::new(id, String::new())
    }

    /// Object id
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Name; empty when unnamed
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the key carries a non-empty name
    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }
}

impl PartialEq for ComponentKey {
    fn eq(&self, other: &Self) -> bool {
        if self.is_named() && other.is_named() {
            self.name == other.name && self.id == other.id
        } else {
            self.id == other.id
        }
    }
}

impl Eq for ComponentKey {}

impl Hash for ComponentKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
