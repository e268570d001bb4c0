//! Entity hierarchy, activation and shutdown cascades

use log::{debug, trace, warn};

use super::graph::{EntityKind, EntityNode, Owner, SceneGraph};
use super::slots::SlotBinding;
use crate::foundation::collections::{ComponentId, EntityId};
use crate::object::Activation;
use crate::transform::Transform;

impl SceneGraph {
    /// Create a root entity with a default transform
    pub fn create_entity(&mut self, name: &str, kind: EntityKind) -> EntityId {
        let entity = self.entities.insert(EntityNode::new(name, kind));
        let transform = self.create_component("transform", Transform::new().into());
        self.replace_slot(entity, SlotBinding::TRANSFORM, transform);
        debug!("Created entity '{name}' ({kind:?})");
        entity
    }

    /// Entity kind
    pub fn kind(&self, entity: EntityId) -> Option<EntityKind> {
        self.entities.get(entity).map(|e| e.kind)
    }

    /// Change an entity's kind and refresh its transform subtree
    pub fn set_kind(&mut self, entity: EntityId, kind: EntityKind) {
        if let Some(node) = self.entities.get_mut(entity) {
            node.kind = kind;
            self.refresh_transform(entity);
        }
    }

    /// Parent entity
    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.entities.get(entity)?.parent
    }

    /// Child entities in attach order
    pub fn children(&self, entity: EntityId) -> Vec<EntityId> {
        self.entities
            .get(entity)
            .map(|e| e.children.iter().map(|(_, c)| *c).collect())
            .unwrap_or_default()
    }

    /// Whether `child` is a direct child of `parent`
    pub fn has_child(&self, parent: EntityId, child: EntityId) -> bool {
        self.entities
            .get(parent)
            .is_some_and(|e| e.children.iter().any(|(_, c)| *c == child))
    }

    /// Spawner that created the entity, while still coupled
    pub fn spawner_of(&self, entity: EntityId) -> Option<EntityId> {
        self.entities.get(entity)?.spawner
    }

    /// Whether `ancestor` appears on `entity`'s parent chain
    pub fn is_ancestor(&self, ancestor: EntityId, entity: EntityId) -> bool {
        let mut current = self.parent(entity);
        for _ in 0..=self.entities.len() {
            match current {
                Some(id) if id == ancestor => return true,
                Some(id) => current = self.parent(id),
                None => return false,
            }
        }
        false
    }

    /// Attach `child` under `parent`
    ///
    /// The child is registered under its current name, pinned by the parent
    /// and its transform refreshed. A child attached elsewhere is detached
    /// from its old parent first.
    pub fn attach_child(&mut self, parent: EntityId, child: EntityId) -> bool {
        if parent == child || self.is_ancestor(child, parent) {
            warn!("Refusing to attach an entity beneath itself");
            return false;
        }
        let (Some(parent_node), Some(child_node)) = (self.entities.get(parent), self.entities.get(child)) else {
            return false;
        };
        if parent_node.identity.is_shutdown() || child_node.identity.is_shutdown() {
            warn!(
                "Cannot attach {} under {}: one of them is shut down",
                child_node.identity.id(),
                parent_node.identity.id()
            );
            return false;
        }
        let current_parent = child_node.parent;
        match current_parent {
            Some(current) if current == parent => return true,
            Some(current) => {
                self.detach_child(current, child);
            }
            None => {}
        }

        let Some(child_node) = self.entities.get_mut(child) else {
            return false;
        };
        if let Err(err) = child_node.identity.lifecycle().reserve() {
            warn!("Cannot attach child: {err}");
            return false;
        }
        child_node.parent = Some(parent);
        child_node.parent_pinned = true;
        let name = child_node.identity.name().to_string();
        if let Some(parent_node) = self.entities.get_mut(parent) {
            parent_node.children.push((name, child));
        }
        self.refresh_transform(child);
        debug!("Attached entity {child:?} under {parent:?}");
        true
    }

    /// Detach a direct child, returning it
    ///
    /// The parent's pin is released, the parent link cleared and the child's
    /// transform refreshed. The child stays live.
    pub fn detach_child(&mut self, parent: EntityId, child: EntityId) -> Option<EntityId> {
        let parent_node = self.entities.get_mut(parent)?;
        let index = parent_node.children.iter().position(|(_, c)| *c == child)?;
        parent_node.children.remove(index);

        if let Some(child_node) = self.entities.get_mut(child) {
            child_node.parent = None;
            release_parent_pin(child_node);
        }
        self.refresh_transform(child);
        debug!("Detached entity {child:?} from {parent:?}");
        Some(child)
    }

    /// Detach the first child named `name`, searching descendants if no
    /// direct child matches
    pub fn detach_child_with_name(&mut self, parent: EntityId, name: &str) -> Option<EntityId> {
        if let Some(child) = self.find_child_with_name(parent, name) {
            return self.detach_child(parent, child);
        }
        for child in self.children(parent) {
            if let Some(found) = self.detach_child_with_name(child, name) {
                return Some(found);
            }
        }
        None
    }

    /// Move `child` under `parent`, or make it a root with `None`
    pub fn set_parent(&mut self, child: EntityId, parent: Option<EntityId>) -> bool {
        if let Some(current) = self.parent(child) {
            if Some(current) == parent {
                return true;
            }
            self.detach_child(current, child);
        }
        match parent {
            Some(parent) => self.attach_child(parent, child),
            None => self.contains_entity(child),
        }
    }

    /// First direct child attached under `name`
    pub fn find_child_with_name(&self, parent: EntityId, name: &str) -> Option<EntityId> {
        self.entities
            .get(parent)?
            .children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| *c)
    }

    /// Direct children carrying `tag`
    pub fn find_children_with_tag(&self, parent: EntityId, tag: &str) -> Vec<EntityId> {
        self.children(parent)
            .into_iter()
            .filter(|c| self.entities.get(*c).is_some_and(|e| e.identity.has_tag(tag)))
            .collect()
    }

    /// Activate or deactivate an entity, cascading to children and components
    ///
    /// Nothing happens unless the entity's own flag actually changes.
    pub fn set_entity_active(&mut self, entity: EntityId, active: bool) -> bool {
        let Some(node) = self.entities.get(entity) else {
            return false;
        };
        let Some(transition) = node.identity.lifecycle().set_active(active) else {
            return false;
        };
        trace!("Entity {} {transition:?}", node.identity.id());
        let active = transition == Activation::Activated;
        for child in self.children(entity) {
            self.set_entity_active(child, active);
        }
        for component in self.entity_components(entity) {
            self.set_component_active(component, active);
        }
        true
    }

    /// Shut an entity down with its children and components
    ///
    /// Idempotent. Each child's structural pin is released and the child shut
    /// down, but children and components stay registered until the sweep.
    pub fn shutdown_entity(&mut self, entity: EntityId) {
        let Some(node) = self.entities.get(entity) else {
            return;
        };
        if !node.identity.lifecycle().shutdown() {
            return;
        }
        debug!("Shutting down entity {} '{}'", node.identity.id(), node.identity.name());

        for child in self.children(entity) {
            if let Some(child_node) = self.entities.get_mut(child) {
                release_parent_pin(child_node);
            }
            self.shutdown_entity(child);
        }
        for component in self.entity_components(entity) {
            self.shutdown_component(component);
        }
        self.release_rigidbody(entity);
        self.decouple_spawned(entity);
    }

    /// Run an entity's variable-rate update
    ///
    /// Refreshes the entity's global position, updates its components, then
    /// recurses into its children.
    pub fn update_entity(&mut self, entity: EntityId, delta: f64) {
        if !self.entity_updatable(entity) {
            return;
        }
        self.refresh_global_position(entity);
        for component in self.entity_components(entity) {
            self.update_component(component, delta);
        }
        for child in self.children(entity) {
            self.update_entity(child, delta);
        }
    }

    /// Run an entity's fixed-rate update: components, then children
    pub fn fixed_update_entity(&mut self, entity: EntityId, delta: f64) {
        if !self.entity_updatable(entity) {
            return;
        }
        for component in self.entity_components(entity) {
            self.fixed_update_component(component, delta);
        }
        for child in self.children(entity) {
            self.fixed_update_entity(child, delta);
        }
    }

    pub(crate) fn entity_components(&self, entity: EntityId) -> Vec<ComponentId> {
        self.registry(Owner::Entity(entity))
            .map(|r| r.to_vec())
            .unwrap_or_default()
    }
}

/// Release the structural pin a parent holds on `child`, at most once
pub(crate) fn release_parent_pin(child: &mut EntityNode) {
    if child.parent_pinned {
        child.parent_pinned = false;
        child.identity.lifecycle().free();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::tests::{Counters, Recorder};

    fn graph() -> SceneGraph {
        SceneGraph::new()
    }

    #[test]
    fn test_attach_child_pins_and_detach_unpins() {
        let mut graph = graph();
        let parent = graph.create_entity("parent", EntityKind::Spatial3d);
        let child = graph.create_entity("child", EntityKind::Spatial3d);

        assert!(graph.attach_child(parent, child));
        assert!(graph.has_child(parent, child));
        assert_eq!(graph.parent(child), Some(parent));
        assert_eq!(graph.entity(child).unwrap().identity().reference_count(), 1);

        assert_eq!(graph.detach_child(parent, child), Some(child));
        assert_eq!(graph.parent(child), None);
        assert_eq!(graph.entity(child).unwrap().identity().reference_count(), 0);
        assert!(!graph.entity(child).unwrap().identity().is_shutdown());
        assert_eq!(graph.detach_child(parent, child), None);
    }

    #[test]
    fn test_attach_rejects_cycles() {
        let mut graph = graph();
        let a = graph.create_entity("a", EntityKind::Spatial3d);
        let b = graph.create_entity("b", EntityKind::Spatial3d);
        assert!(graph.attach_child(a, b));

        assert!(!graph.attach_child(b, a));
        assert!(!graph.attach_child(a, a));
    }

    #[test]
    fn test_set_parent_moves_child() {
        let mut graph = graph();
        let first = graph.create_entity("first", EntityKind::Spatial3d);
        let second = graph.create_entity("second", EntityKind::Spatial3d);
        let child = graph.create_entity("child", EntityKind::Spatial3d);

        assert!(graph.set_parent(child, Some(first)));
        assert!(graph.set_parent(child, Some(second)));
        assert!(!graph.has_child(first, child));
        assert!(graph.has_child(second, child));
        assert_eq!(graph.entity(child).unwrap().identity().reference_count(), 1);

        assert!(graph.set_parent(child, None));
        assert_eq!(graph.parent(child), None);
        assert_eq!(graph.entity(child).unwrap().identity().reference_count(), 0);
    }

    #[test]
    fn test_name_and_tag_lookup_is_single_level() {
        let mut graph = graph();
        let root = graph.create_entity("root", EntityKind::Spatial3d);
        let child = graph.create_entity("child", EntityKind::Spatial3d);
        let grandchild = graph.create_entity("grandchild", EntityKind::Spatial3d);
        graph.attach_child(root, child);
        graph.attach_child(child, grandchild);
        graph.entity_mut(child).unwrap().identity_mut().add_tag("enemy");
        graph.entity_mut(grandchild).unwrap().identity_mut().add_tag("enemy");

        assert_eq!(graph.find_child_with_name(root, "child"), Some(child));
        assert_eq!(graph.find_child_with_name(root, "grandchild"), None);
        assert_eq!(graph.find_children_with_tag(root, "enemy"), vec![child]);
    }

    #[test]
    fn test_detach_child_with_name_searches_descendants() {
        let mut graph = graph();
        let root = graph.create_entity("root", EntityKind::Spatial3d);
        let child = graph.create_entity("child", EntityKind::Spatial3d);
        let grandchild = graph.create_entity("grandchild", EntityKind::Spatial3d);
        graph.attach_child(root, child);
        graph.attach_child(child, grandchild);

        assert_eq!(graph.detach_child_with_name(root, "grandchild"), Some(grandchild));
        assert!(!graph.has_child(child, grandchild));
        assert_eq!(graph.detach_child_with_name(root, "missing"), None);
    }

    #[test]
    fn test_set_active_cascades_once_per_transition() {
        let mut graph = graph();
        let root = graph.create_entity("root", EntityKind::Spatial3d);
        let child = graph.create_entity("child", EntityKind::Spatial3d);
        graph.attach_child(root, child);
        let counters = Counters::default();
        graph
            .add_component(child.into(), "recorder", Recorder::body(&counters))
            .unwrap();

        assert!(!graph.set_entity_active(root, true));
        assert_eq!(counters.activations() + counters.deactivations(), 0);

        assert!(graph.set_entity_active(root, false));
        assert!(!graph.entity(child).unwrap().identity().is_active());
        assert_eq!(counters.deactivations(), 1);

        assert!(graph.set_entity_active(root, true));
        assert_eq!(counters.activations(), 1);
    }

    #[test]
    fn test_update_skips_inactive_children() {
        let mut graph = graph();
        let root = graph.create_entity("root", EntityKind::Spatial3d);
        let child = graph.create_entity("child", EntityKind::Spatial3d);
        graph.attach_child(root, child);
        let counters = Counters::default();
        graph
            .add_component(child.into(), "recorder", Recorder::body(&counters))
            .unwrap();

        graph.update_entity(root, 0.016);
        graph.fixed_update_entity(root, 0.016);
        assert_eq!(counters.updates(), 1);
        assert_eq!(counters.fixed_updates(), 1);

        graph.set_entity_active(child, false);
        graph.update_entity(root, 0.016);
        graph.fixed_update_entity(root, 0.016);
        assert_eq!(counters.updates(), 1);
        assert_eq!(counters.fixed_updates(), 1);
    }

    #[test]
    fn test_double_shutdown_is_idempotent() {
        let mut graph = graph();
        let root = graph.create_entity("root", EntityKind::Spatial3d);
        let child = graph.create_entity("child", EntityKind::Spatial3d);
        graph.attach_child(root, child);
        let counters = Counters::default();
        graph
            .add_component(root.into(), "recorder", Recorder::body(&counters))
            .unwrap();

        graph.shutdown_entity(root);
        let pins = graph.entity(child).unwrap().identity().reference_count();
        graph.shutdown_entity(root);

        assert_eq!(counters.shutdowns(), 1);
        assert_eq!(pins, 0);
        assert_eq!(graph.entity(child).unwrap().identity().reference_count(), 0);
        assert!(graph.has_child(root, child));
    }
}
