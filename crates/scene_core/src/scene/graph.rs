//! Scene graph arena
//!
//! The graph owns every entity and component node. Parent, owner and
//! spawner links are generation-indexed handles, so a link to a reclaimed
//! node simply fails to resolve. Structural operations are methods on
//! [`SceneGraph`] spread across the sibling modules:
//!
//! - `components`: component registry attach/detach/lookup and hooks
//! - `entities`: child entities, activation and shutdown cascades
//! - `slots`: transform/mesh/rigidbody slot replacement
//! - `propagation`: transform mutation and hierarchical refresh
//! - `sweep`: reclamation of shut-down, unpinned nodes

use serde::{Deserialize, Serialize};

use super::physics::PhysicsHooks;
use super::spawner::SpawnerState;
use crate::component::{ComponentBody, ComponentRegistry, ComponentType};
use crate::error::SceneResult;
use crate::foundation::collections::{ComponentId, EntityId, HandleMap};
use crate::object::{LifecycleHandle, ObjectIdentity, PinGuard};

/// Entity kind; transform inheritance only applies between equal kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityKind {
    /// 3D scene object
    #[default]
    Spatial3d,
    /// 2D overlay object
    Spatial2d,
    /// Light source
    Light,
    /// Sound emitter
    Sound,
}

/// Holder of a component registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    /// Component attached directly to an entity
    Entity(EntityId),
    /// Component attached to another component
    Component(ComponentId),
}

impl From<EntityId> for Owner {
    fn from(entity: EntityId) -> Self {
        Self::Entity(entity)
    }
}

impl From<ComponentId> for Owner {
    fn from(component: ComponentId) -> Self {
        Self::Component(component)
    }
}

/// Cached handles of an entity's built-in components
///
/// Each slot, when set, refers to a component that is also present in the
/// entity's registry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DistinguishedSlots {
    /// Transform component
    pub transform: Option<ComponentId>,
    /// Mesh component
    pub mesh: Option<ComponentId>,
    /// Rigidbody component
    pub rigidbody: Option<ComponentId>,
}

/// A component stored in the arena
#[derive(Debug)]
pub struct ComponentNode {
    pub(crate) identity: ObjectIdentity,
    pub(crate) body: Option<ComponentBody>,
    pub(crate) component_type: ComponentType,
    pub(crate) owner: Option<Owner>,
    pub(crate) children: ComponentRegistry,
}

impl ComponentNode {
    pub(crate) fn new(name: &str, body: ComponentBody) -> Self {
        Self {
            identity: ObjectIdentity::new(name),
            component_type: body.component_type(),
            body: Some(body),
            owner: None,
            children: ComponentRegistry::new(),
        }
    }

    /// Id, name, tags and lifecycle
    pub fn identity(&self) -> &ObjectIdentity {
        &self.identity
    }

    /// Mutable identity; renaming does not re-key the holder's registry
    pub fn identity_mut(&mut self) -> &mut ObjectIdentity {
        &mut self.identity
    }

    /// Payload; `None` while the component's own hook is running
    pub fn body(&self) -> Option<&ComponentBody> {
        self.body.as_ref()
    }

    /// Mutable payload
    pub fn body_mut(&mut self) -> Option<&mut ComponentBody> {
        self.body.as_mut()
    }

    /// Type tag of the payload
    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    /// Holder this component is attached to
    pub fn owner(&self) -> Option<Owner> {
        self.owner
    }

    /// Child components
    pub fn children(&self) -> &ComponentRegistry {
        &self.children
    }
}

/// An entity stored in the arena
#[derive(Debug)]
pub struct EntityNode {
    pub(crate) identity: ObjectIdentity,
    pub(crate) kind: EntityKind,
    pub(crate) parent: Option<EntityId>,
    /// Whether the parent still holds the structural pin taken on attach
    pub(crate) parent_pinned: bool,
    pub(crate) spawner: Option<EntityId>,
    pub(crate) components: ComponentRegistry,
    pub(crate) slots: DistinguishedSlots,
    pub(crate) children: Vec<(String, EntityId)>,
    pub(crate) spawner_state: Option<SpawnerState>,
}

impl EntityNode {
    pub(crate) fn new(name: &str, kind: EntityKind) -> Self {
        Self {
            identity: ObjectIdentity::new(name),
            kind,
            parent: None,
            parent_pinned: false,
            spawner: None,
            components: ComponentRegistry::new(),
            slots: DistinguishedSlots::default(),
            children: Vec::new(),
            spawner_state: None,
        }
    }

    /// Id, name, tags and lifecycle
    pub fn identity(&self) -> &ObjectIdentity {
        &self.identity
    }

    /// Mutable identity; renaming does not re-key the parent's child map
    pub fn identity_mut(&mut self) -> &mut ObjectIdentity {
        &mut self.identity
    }

    /// Entity kind
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Parent entity
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Spawner that created this entity, while still coupled
    pub fn spawner(&self) -> Option<EntityId> {
        self.spawner
    }

    /// Attached components
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// Built-in component slots
    pub fn slots(&self) -> DistinguishedSlots {
        self.slots
    }

    /// Child entities with the names they were attached under
    pub fn children(&self) -> &[(String, EntityId)] {
        &self.children
    }

    /// Whether the entity has any children
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Whether this entity spawns others
    pub fn is_spawner(&self) -> bool {
        self.spawner_state.is_some()
    }
}

/// Arena of entities and components with the physics collaborator
pub struct SceneGraph {
    pub(crate) entities: HandleMap<EntityId, EntityNode>,
    pub(crate) components: HandleMap<ComponentId, ComponentNode>,
    pub(crate) physics: Option<Box<dyn PhysicsHooks>>,
    pub(crate) axis_lock_epsilon: f64,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            entities: HandleMap::with_key(),
            components: HandleMap::with_key(),
            physics: None,
            axis_lock_epsilon: 1e-9,
        }
    }

    /// Set the tolerance below which a locked axis is not corrected
    pub fn set_axis_lock_epsilon(&mut self, epsilon: f64) {
        self.axis_lock_epsilon = epsilon.max(0.0);
    }

    /// Install the physics collaborator, returning the previous one
    pub fn set_physics(&mut self, physics: Box<dyn PhysicsHooks>) -> Option<Box<dyn PhysicsHooks>> {
        self.physics.replace(physics)
    }

    /// Remove the physics collaborator
    pub fn take_physics(&mut self) -> Option<Box<dyn PhysicsHooks>> {
        self.physics.take()
    }

    /// Entity node
    pub fn entity(&self, id: EntityId) -> Option<&EntityNode> {
        self.entities.get(id)
    }

    /// Mutable entity node
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut EntityNode> {
        self.entities.get_mut(id)
    }

    /// Component node
    pub fn component(&self, id: ComponentId) -> Option<&ComponentNode> {
        self.components.get(id)
    }

    /// Mutable component node
    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut ComponentNode> {
        self.components.get_mut(id)
    }

    /// Whether `id` refers to an entity still in the arena
    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Whether `id` refers to a component still in the arena
    pub fn contains_component(&self, id: ComponentId) -> bool {
        self.components.contains_key(id)
    }

    /// Entities in the arena, including zombies awaiting the sweep
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Components in the arena, including zombies awaiting the sweep
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Handles of every entity in the arena
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().collect()
    }

    /// Lifecycle of an entity, shareable across threads
    pub fn entity_lifecycle(&self, id: EntityId) -> Option<LifecycleHandle> {
        self.entities.get(id).map(|e| e.identity.lifecycle_handle())
    }

    /// Lifecycle of a component, shareable across threads
    pub fn component_lifecycle(&self, id: ComponentId) -> Option<LifecycleHandle> {
        self.components.get(id).map(|c| c.identity.lifecycle_handle())
    }

    /// Pin an entity; `None` if it is no longer in the arena
    pub fn pin_entity(&self, id: EntityId) -> Option<SceneResult<PinGuard>> {
        self.entity_lifecycle(id).map(PinGuard::acquire)
    }

    /// Pin a component; `None` if it is no longer in the arena
    pub fn pin_component(&self, id: ComponentId) -> Option<SceneResult<PinGuard>> {
        self.component_lifecycle(id).map(PinGuard::acquire)
    }

    /// Whether an entity is live and active
    pub(crate) fn entity_updatable(&self, id: EntityId) -> bool {
        self.entities
            .get(id)
            .is_some_and(|e| e.identity.lifecycle().is_updatable())
    }

    /// Whether a component is live and active
    pub(crate) fn component_updatable(&self, id: ComponentId) -> bool {
        self.components
            .get(id)
            .is_some_and(|c| c.identity.lifecycle().is_updatable())
    }

    /// Entity a component is attached to, following component owners upward
    pub fn owning_entity(&self, component: ComponentId) -> Option<EntityId> {
        let mut current = component;
        // Bounded by the arena size so a malformed owner cycle cannot spin
        for _ in 0..=self.components.len() {
            match self.components.get(current)?.owner? {
                Owner::Entity(entity) => return Some(entity),
                Owner::Component(parent) => current = parent,
            }
        }
        None
    }

    /// Registry of a holder
    pub fn registry(&self, holder: Owner) -> Option<&ComponentRegistry> {
        match holder {
            Owner::Entity(id) => self.entities.get(id).map(|e| &e.components),
            Owner::Component(id) => self.components.get(id).map(|c| &c.children),
        }
    }

    pub(crate) fn registry_mut(&mut self, holder: Owner) -> Option<&mut ComponentRegistry> {
        match holder {
            Owner::Entity(id) => self.entities.get_mut(id).map(|e| &mut e.components),
            Owner::Component(id) => self.components.get_mut(id).map(|c| &mut c.children),
        }
    }

    /// Whether the holder is still in the arena
    pub fn contains_holder(&self, holder: Owner) -> bool {
        match holder {
            Owner::Entity(id) => self.contains_entity(id),
            Owner::Component(id) => self.contains_component(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Mesh;

    #[test]
    fn test_owning_entity_follows_component_chain() {
        let mut graph = SceneGraph::new();
        let entity = graph.create_entity("ship", EntityKind::Spatial3d);
        let outer = graph
            .add_component(entity.into(), "hull", Mesh::new("hull", 1.0).into())
            .unwrap();
        let inner = graph
            .add_component(outer.into(), "decal", Mesh::new("decal", 0.1).into())
            .unwrap();

        assert_eq!(graph.owning_entity(inner), Some(entity));
        assert_eq!(graph.owning_entity(outer), Some(entity));
    }

    #[test]
    fn test_pin_entity_tracks_reference_count() {
        let mut graph = SceneGraph::new();
        let entity = graph.create_entity("crate", EntityKind::Spatial3d);
        let pin = graph.pin_entity(entity).unwrap().unwrap();

        assert_eq!(graph.entity(entity).unwrap().identity().reference_count(), 1);
        drop(pin);
        assert_eq!(graph.entity(entity).unwrap().identity().reference_count(), 0);
    }
}
