//! Handle types for the scene arenas
//!
//! Entities and components live in generation-indexed slot maps. A handle
//! stays valid until its slot is reclaimed; after that, lookups with the
//! stale handle fail instead of aliasing whatever reuses the slot.

pub use slotmap::{Key, SlotMap};

slotmap::new_key_type! {
    /// Generation-indexed handle to an entity in a scene graph
    pub struct EntityId;

    /// Generation-indexed handle to a component in a scene graph
    pub struct ComponentId;

    /// Handle to a registered transform listener
    pub struct ListenerId;
}

/// Arena of values addressed by a handle type
pub type HandleMap<K, T> = SlotMap<K, T>;
