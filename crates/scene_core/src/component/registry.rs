//! Keyed, insertion-ordered registry of components
//!
//! Holders (entities and components) keep their attached components here.
//! Iteration follows attach order so update cascades are deterministic.

use std::collections::hash_map::{Entry, HashMap};

use super::key::ComponentKey;
use crate::foundation::collections::ComponentId;
use crate::object::ObjectId;

/// How a caller identifies a component inside a holder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentSelector<'a> {
    /// Arena handle
    Handle(ComponentId),
    /// Component name
    Name(&'a str),
    /// Object id
    Id(ObjectId),
}

impl From<ComponentId> for ComponentSelector<'_> {
    fn from(handle: ComponentId) -> Self {
        Self::Handle(handle)
    }
}

impl From<ObjectId> for ComponentSelector<'_> {
    fn from(id: ObjectId) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a str> for ComponentSelector<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

/// Registry mapping component keys to arena handles
///
/// Lookups hash through [`ComponentKey`], so a bare id lookup finds a named
/// entry with the same id. `order` keeps attach order for iteration.
#[derive(Debug, Default, Clone)]
pub struct ComponentRegistry {
    entries: HashMap<ComponentKey, ComponentId>,
    order: Vec<ComponentId>,
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered components
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Insert `handle` under `key`
    ///
    /// If an equal key is already registered the registry is left untouched
    /// and the existing handle is returned as `Err`.
    pub fn insert(&mut self, key: ComponentKey, handle: ComponentId) -> Result<(), ComponentId> {
        match self.entries.entry(key) {
            Entry::Occupied(existing) => Err(*existing.get()),
            Entry::Vacant(slot) => {
                slot.insert(handle);
                self.order.push(handle);
                Ok(())
            }
        }
    }

    /// Handle registered under a key equal to `key`
    pub fn get(&self, key: &ComponentKey) -> Option<ComponentId> {
        self.entries.get(key).copied()
    }

    /// Key `handle` is registered under
    pub fn key_of(&self, handle: ComponentId) -> Option<&ComponentKey> {
        self.entries.iter().find(|(_, h)| **h == handle).map(|(k, _)| k)
    }

    /// First handle, in attach order, whose key carries `name`
    ///
    /// Names alone cannot be looked up through key equality, since a named key
    /// only equals another named key with the same id; this scans instead.
    pub fn find_by_name(&self, name: &str) -> Option<ComponentId> {
        if name.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .filter(|(k, _)| k.name() == name)
            .filter_map(|(_, h)| self.position(*h).map(|index| (index, *h)))
            .min_by_key(|(index, _)| *index)
            .map(|(_, h)| h)
    }

    /// Handle of the component with object id `id`
    pub fn find_by_id(&self, id: ObjectId) -> Option<ComponentId> {
        self.get(&ComponentKey::from_id(id))
    }

    /// Whether `handle` is registered
    pub fn contains(&self, handle: ComponentId) -> bool {
        self.order.contains(&handle)
    }

    /// Resolve a selector to a registered handle
    pub fn resolve(&self, selector: ComponentSelector<'_>) -> Option<ComponentId> {
        match selector {
            ComponentSelector::Handle(handle) => self.contains(handle).then_some(handle),
            ComponentSelector::Name(name) => self.find_by_name(name),
            ComponentSelector::Id(id) => self.find_by_id(id),
        }
    }

    /// Remove `handle`, returning its key
    pub fn remove(&mut self, handle: ComponentId) -> Option<ComponentKey> {
        let index = self.position(handle)?;
        self.order.remove(index);
        let key = self.key_of(handle)?.clone();
        self.entries.remove_entry(&key).map(|(k, _)| k)
    }

    /// Handles in attach order
    pub fn handles(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.order.iter().copied()
    }

    /// Snapshot of the handles, for traversals that mutate the arena
    pub fn to_vec(&self) -> Vec<ComponentId> {
        self.order.clone()
    }

    fn position(&self, handle: ComponentId) -> Option<usize> {
        self.order.iter().position(|h| *h == handle)
    }
}
