//! Distinguished component slots
//!
//! An entity caches its transform, mesh and rigidbody handles for O(1)
//! access. All three share one replacement flow, parameterized by a
//! [`SlotBinding`]: detach and shut down the previous occupant, run the
//! slot-specific teardown, register the newcomer, then run the slot-specific
//! bind step.

use log::debug;

use super::graph::{DistinguishedSlots, Owner, SceneGraph};
use crate::component::{ComponentBody, ComponentType, Mesh, Rigidbody};
use crate::foundation::collections::{ComponentId, EntityId};
use crate::transform::Transform;

/// Accessors and side effects of one distinguished slot
#[derive(Clone, Copy)]
pub(crate) struct SlotBinding {
    pub(crate) label: &'static str,
    read: fn(&DistinguishedSlots) -> Option<ComponentId>,
    write: fn(&mut DistinguishedSlots, Option<ComponentId>),
    teardown: fn(&mut SceneGraph, EntityId, ComponentId),
    bind: fn(&mut SceneGraph, EntityId, ComponentId),
}

impl SlotBinding {
    pub(crate) const TRANSFORM: Self = Self {
        label: "transform",
        read: |s| s.transform,
        write: |s, v| s.transform = v,
        teardown: |graph, _, component| {
            if let Some(transform) = graph.transform_mut(component) {
                transform.listeners_mut().clear();
            }
        },
        bind: |graph, entity, _| graph.refresh_transform(entity),
    };

    pub(crate) const MESH: Self = Self {
        label: "mesh",
        read: |s| s.mesh,
        write: |s, v| s.mesh = v,
        teardown: |_, _, _| {},
        bind: |_, _, _| {},
    };

    pub(crate) const RIGIDBODY: Self = Self {
        label: "rigidbody",
        read: |s| s.rigidbody,
        write: |s, v| s.rigidbody = v,
        // A shut-down entity was deregistered by its shutdown cascade
        teardown: |graph, entity, component| {
            if !graph.entity_shut_down(entity) {
                graph.deregister_rigidbody(entity, component);
            }
        },
        bind: |graph, entity, component| {
            if graph.entity_shut_down(entity) {
                return;
            }
            if let Some(physics) = graph.physics.as_mut() {
                physics.add_rigidbody(entity, component);
            }
        },
    };

    const ALL: [Self; 3] = [Self::TRANSFORM, Self::MESH, Self::RIGIDBODY];

    /// Slot that components of type `ty` occupy, if any
    pub(crate) fn for_type(ty: ComponentType) -> Option<Self> {
        match ty {
            ComponentType::Transform => Some(Self::TRANSFORM),
            ComponentType::Mesh => Some(Self::MESH),
            ComponentType::Rigidbody => Some(Self::RIGIDBODY),
            ComponentType::Custom(_) => None,
        }
    }
}

impl SceneGraph {
    /// Install `component` in the slot described by `binding`
    ///
    /// Attaching the current occupant again is a no-op returning it.
    pub(crate) fn replace_slot(
        &mut self,
        entity: EntityId,
        binding: SlotBinding,
        component: ComponentId,
    ) -> Option<ComponentId> {
        let current = (binding.read)(&self.entities.get(entity)?.slots);
        if current == Some(component) {
            return Some(component);
        }
        if let Some(previous) = current {
            debug!("Replacing {} slot occupant of entity {entity:?}", binding.label);
            self.detach_resolved(Owner::Entity(entity), previous);
        }

        let attached = self.insert_into_registry(Owner::Entity(entity), component)?;
        if let Some(node) = self.entities.get_mut(entity) {
            (binding.write)(&mut node.slots, Some(attached));
        }
        (binding.bind)(self, entity, attached);
        Some(attached)
    }

    /// Clear whichever slot `component` occupies and run its teardown
    pub(crate) fn release_slot(&mut self, entity: EntityId, component: ComponentId) {
        let Some(node) = self.entities.get_mut(entity) else {
            return;
        };
        for binding in SlotBinding::ALL {
            if (binding.read)(&node.slots) == Some(component) {
                (binding.write)(&mut node.slots, None);
                (binding.teardown)(self, entity, component);
                return;
            }
        }
    }

    /// Deregister an entity's rigidbody from the physics collaborator,
    /// keeping the slot populated
    pub(crate) fn release_rigidbody(&mut self, entity: EntityId) {
        if let Some(body) = self.entities.get(entity).and_then(|e| e.slots.rigidbody) {
            self.deregister_rigidbody(entity, body);
        }
    }

    fn deregister_rigidbody(&mut self, entity: EntityId, body: ComponentId) {
        if let Some(physics) = self.physics.as_mut() {
            physics.remove_rigidbody(entity, body);
        }
    }

    fn entity_shut_down(&self, entity: EntityId) -> bool {
        self.entities
            .get(entity)
            .map_or(true, |e| e.identity.is_shutdown())
    }

    /// Transform slot of an entity
    pub fn transform_of(&self, entity: EntityId) -> Option<ComponentId> {
        self.entities.get(entity)?.slots.transform
    }

    /// Mesh slot of an entity
    pub fn mesh_of(&self, entity: EntityId) -> Option<ComponentId> {
        self.entities.get(entity)?.slots.mesh
    }

    /// Rigidbody slot of an entity
    pub fn rigidbody_of(&self, entity: EntityId) -> Option<ComponentId> {
        self.entities.get(entity)?.slots.rigidbody
    }

    /// Transform data of a component
    pub fn transform(&self, component: ComponentId) -> Option<&Transform> {
        match self.components.get(component)?.body.as_ref()? {
            ComponentBody::Transform(transform) => Some(transform),
            _ => None,
        }
    }

    /// Mutable transform data of a component
    ///
    /// Position and rotation setters that propagate live on the graph; this
    /// accessor is for scale and other local-only state.
    pub fn transform_mut(&mut self, component: ComponentId) -> Option<&mut Transform> {
        match self.components.get_mut(component)?.body.as_mut()? {
            ComponentBody::Transform(transform) => Some(transform),
            _ => None,
        }
    }

    /// Transform data of an entity's transform slot
    pub fn entity_transform(&self, entity: EntityId) -> Option<&Transform> {
        self.transform(self.transform_of(entity)?)
    }

    /// Mesh data of an entity's mesh slot
    pub fn mesh(&self, entity: EntityId) -> Option<&Mesh> {
        match self.components.get(self.mesh_of(entity)?)?.body.as_ref()? {
            ComponentBody::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// Mutable mesh data of an entity's mesh slot
    pub fn mesh_mut(&mut self, entity: EntityId) -> Option<&mut Mesh> {
        let slot = self.mesh_of(entity)?;
        match self.components.get_mut(slot)?.body.as_mut()? {
            ComponentBody::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// Rigidbody data of an entity's rigidbody slot
    pub fn rigidbody(&self, entity: EntityId) -> Option<&Rigidbody> {
        match self.components.get(self.rigidbody_of(entity)?)?.body.as_ref()? {
            ComponentBody::Rigidbody(body) => Some(body),
            _ => None,
        }
    }

    /// Mutable rigidbody data of an entity's rigidbody slot
    pub fn rigidbody_mut(&mut self, entity: EntityId) -> Option<&mut Rigidbody> {
        let slot = self.rigidbody_of(entity)?;
        match self.components.get_mut(slot)?.body.as_mut()? {
            ComponentBody::Rigidbody(body) => Some(body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::scene::tests::{PhysicsLog, RecordingPhysics};
    use crate::scene::EntityKind;
    use crate::transform::TransformListener;
    use std::sync::Arc;

    struct Silent;
    impl TransformListener for Silent {}

    #[test]
    fn test_new_entity_has_transform_slot() {
        let mut graph = SceneGraph::new();
        let entity = graph.create_entity("e", EntityKind::Spatial3d);
        let slot = graph.transform_of(entity).unwrap();

        assert!(graph.registry(entity.into()).unwrap().contains(slot));
        assert!(graph.entity_transform(entity).is_some());
    }

    #[test]
    fn test_replacing_transform_shuts_old_one_down_and_clears_listeners() {
        let mut graph = SceneGraph::new();
        let entity = graph.create_entity("e", EntityKind::Spatial3d);
        let old = graph.transform_of(entity).unwrap();
        graph.add_transform_listener(old, Arc::new(Silent)).unwrap();

        let new = graph
            .add_component(entity.into(), "transform2", Transform::from_position(Vec3::x()).into())
            .unwrap();

        assert_eq!(graph.transform_of(entity), Some(new));
        assert!(!graph.registry(entity.into()).unwrap().contains(old));
        let old_node = graph.component(old).unwrap();
        assert!(old_node.identity().is_shutdown());
        assert!(graph.transform(old).unwrap().listeners().is_empty());
    }

    #[test]
    fn test_reattaching_slot_occupant_is_noop() {
        let mut graph = SceneGraph::new();
        let entity = graph.create_entity("e", EntityKind::Spatial3d);
        let slot = graph.transform_of(entity).unwrap();

        assert_eq!(graph.attach_component(entity.into(), slot), Some(slot));
        assert_eq!(graph.transform_of(entity), Some(slot));
        assert!(!graph.component(slot).unwrap().identity().is_shutdown());
    }

    #[test]
    fn test_rigidbody_slot_notifies_physics() {
        let mut graph = SceneGraph::new();
        let log = PhysicsLog::default();
        graph.set_physics(Box::new(RecordingPhysics::new(&log)));
        let entity = graph.create_entity("e", EntityKind::Spatial3d);

        let first = graph
            .add_component(entity.into(), "body", Rigidbody::default().into())
            .unwrap();
        let second = graph
            .add_component(entity.into(), "body2", Rigidbody::default().into())
            .unwrap();
        assert_eq!(log.added(), vec![first, second]);
        assert_eq!(log.removed(), vec![first]);

        assert_eq!(graph.detach_component(entity.into(), second), Some(second));
        assert_eq!(graph.rigidbody_of(entity), None);
        assert_eq!(log.removed(), vec![first, second]);
    }

    #[test]
    fn test_rigidbody_of_shut_down_entity_is_deregistered_once() {
        let mut graph = SceneGraph::new();
        let log = PhysicsLog::default();
        graph.set_physics(Box::new(RecordingPhysics::new(&log)));
        let entity = graph.create_entity("e", EntityKind::Spatial3d);
        let body = graph
            .add_component(entity.into(), "body", Rigidbody::default().into())
            .unwrap();

        graph.shutdown_entity(entity);
        assert_eq!(log.removed(), vec![body]);

        assert_eq!(graph.detach_component(entity.into(), body), Some(body));
        assert_eq!(graph.rigidbody_of(entity), None);
        assert_eq!(log.removed(), vec![body]);

        graph.add_component(entity.into(), "late", Rigidbody::default().into());
        assert_eq!(log.added(), vec![body]);
    }

    #[test]
    fn test_detaching_mesh_clears_slot() {
        let mut graph = SceneGraph::new();
        let entity = graph.create_entity("e", EntityKind::Spatial3d);
        let mesh = graph
            .add_component(entity.into(), "mesh", Mesh::new("cube", 1.0).into())
            .unwrap();
        assert_eq!(graph.mesh(entity).map(|m| m.asset.as_str()), Some("cube"));

        graph.destroy_component(entity.into(), "mesh");
        assert_eq!(graph.mesh_of(entity), None);
        assert!(graph.component(mesh).unwrap().identity().is_shutdown());
    }
}
