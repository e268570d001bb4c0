//! Process-wide object identity
//!
//! Every entity and component carries an [`ObjectIdentity`]: a unique id
//! drawn from one global counter, a free-form name, a tag set and the shared
//! lifecycle cell.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::lifecycle::{Lifecycle, LifecycleHandle};

/// Process-unique object id; never zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Raw id value
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

static NEXT_OBJECT_ID: Mutex<u32> = parking_lot::const_mutex(1);

/// Allocate the next object id under the global lock
///
/// Ids increase monotonically. On wrap-around the counter skips zero.
pub fn allocate_object_id() -> ObjectId {
    let mut next = NEXT_OBJECT_ID.lock();
    let id = *next;
    *next = match next.wrapping_add(1) {
        0 => 1,
        n => n,
    };
    ObjectId(id)
}

/// Id, name, tags and lifecycle shared by entities and components
#[derive(Debug)]
pub struct ObjectIdentity {
    id: ObjectId,
    name: String,
    tags: HashSet<String>,
    lifecycle: LifecycleHandle,
}

impl ObjectIdentity {
    /// Create a new identity with a fresh id; an empty name means unnamed
    pub fn new(name: impl Into<String>) -> Self {
        let id = allocate_object_id();
        Self {
            id,
            name: name.into(),
            tags: HashSet::new(),
            lifecycle: Lifecycle::new(id),
        }
    }

    /// Unique id
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Name; empty when unnamed
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the object
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Add a tag; returns `false` if it was already present
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    /// Remove a tag; returns whether it was present
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    /// Whether the tag is present
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Remove every tag
    pub fn clear_tags(&mut self) {
        self.tags.clear();
    }

    /// Iterate over the tags in no particular order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Lifecycle cell
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Shareable handle to the lifecycle cell
    pub fn lifecycle_handle(&self) -> LifecycleHandle {
        Arc::clone(&self.lifecycle)
    }

    /// Whether the object is active
    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    /// Whether the object has been shut down
    pub fn is_shutdown(&self) -> bool {
        self.lifecycle.is_shutdown()
    }

    /// Outstanding pins
    pub fn reference_count(&self) -> u32 {
        self.lifecycle.reference_count()
    }
}
