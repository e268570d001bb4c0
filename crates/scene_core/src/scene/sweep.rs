//! Reclamation of shut-down nodes
//!
//! Shutdown only marks a node; memory is released here, once the node is a
//! zombie with no outstanding pins. Reclaiming a node unhooks every link
//! that still points at it so nothing in the arena is left dangling.

use log::{debug, error};

use super::entities::release_parent_pin;
use super::graph::{Owner, SceneGraph};
use crate::component::{ComponentBody, ComponentType};
use crate::error::{SceneError, SceneResult};
use crate::foundation::collections::{ComponentId, EntityId};

/// What a sweep removed from the arena
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Entities reclaimed
    pub entities: Vec<EntityId>,
    /// Number of components reclaimed
    pub components: usize,
}

impl SweepReport {
    /// Whether nothing was reclaimed
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.components == 0
    }
}

impl SceneGraph {
    /// Reclaim every shut-down node that nobody pins
    ///
    /// Pinned zombies are left for a later sweep.
    pub fn sweep(&mut self) -> SweepReport {
        let (entities, components) = self.shutdown_nodes();
        let mut report = SweepReport::default();

        for entity in entities {
            let reclaimed = self
                .entities
                .get(entity)
                .is_some_and(|e| e.identity.lifecycle().try_reclaim());
            if reclaimed {
                self.remove_entity_node(entity);
                report.entities.push(entity);
            }
        }
        for component in components {
            let reclaimed = self
                .components
                .get(component)
                .is_some_and(|c| c.identity.lifecycle().try_reclaim());
            if reclaimed {
                self.remove_component_node(component);
                report.components += 1;
            }
        }

        if !report.is_empty() {
            debug!(
                "Sweep reclaimed {} entities and {} components",
                report.entities.len(),
                report.components
            );
        }
        report
    }

    /// Reclaim every shut-down node immediately
    ///
    /// Pinned nodes are refused and logged; the first refusal is returned as
    /// [`SceneError::StillReferenced`] after everything else is reclaimed.
    pub fn destroy_all_shutdown(&mut self) -> SceneResult<SweepReport> {
        let (entities, components) = self.shutdown_nodes();
        let mut report = SweepReport::default();
        let mut refused: Option<SceneError> = None;

        for entity in entities {
            let Some(node) = self.entities.get(entity) else {
                continue;
            };
            match node.identity.lifecycle().force_reclaim() {
                Ok(()) => {
                    self.remove_entity_node(entity);
                    report.entities.push(entity);
                }
                Err(err) => {
                    error!("Refusing to destroy entity '{}': {err}", node.identity.name());
                    refused.get_or_insert(err);
                }
            }
        }
        for component in components {
            let Some(node) = self.components.get(component) else {
                continue;
            };
            match node.identity.lifecycle().force_reclaim() {
                Ok(()) => {
                    self.remove_component_node(component);
                    report.components += 1;
                }
                Err(err) => {
                    error!("Refusing to destroy component '{}': {err}", node.identity.name());
                    refused.get_or_insert(err);
                }
            }
        }

        debug!(
            "Destroyed {} entities and {} components",
            report.entities.len(),
            report.components
        );
        match refused {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    fn shutdown_nodes(&self) -> (Vec<EntityId>, Vec<ComponentId>) {
        let entities = self
            .entities
            .iter()
            .filter(|(_, e)| e.identity.is_shutdown())
            .map(|(id, _)| id)
            .collect();
        let components = self
            .components
            .iter()
            .filter(|(_, c)| c.identity.is_shutdown())
            .map(|(id, _)| id)
            .collect();
        (entities, components)
    }

    fn remove_entity_node(&mut self, entity: EntityId) {
        let Some(node) = self.entities.remove(entity) else {
            return;
        };

        if let Some(parent) = node.parent.and_then(|p| self.entities.get_mut(p)) {
            parent.children.retain(|(_, c)| *c != entity);
        }
        for (_, child) in &node.children {
            if let Some(child_node) = self.entities.get_mut(*child) {
                child_node.parent = None;
                release_parent_pin(child_node);
            }
            self.refresh_transform(*child);
        }
        for component in node.components.handles() {
            if let Some(component_node) = self.components.get_mut(component) {
                component_node.owner = None;
            }
        }
        if let Some(spawner) = node.spawner {
            self.note_spawn_reclaimed(spawner, entity);
        }
        if let Some(state) = node.spawner_state {
            for (_, spawned) in state.into_spawned() {
                if let Some(spawned_node) = self.entities.get_mut(spawned) {
                    spawned_node.spawner = None;
                }
            }
        }
        debug!("Reclaimed entity {} '{}'", node.identity.id(), node.identity.name());
    }

    fn remove_component_node(&mut self, component: ComponentId) {
        let Some(node) = self.components.remove(component) else {
            return;
        };

        if let Some(owner) = node.owner {
            if let Some(registry) = self.registry_mut(owner) {
                registry.remove(component);
            }
            if let Owner::Entity(entity) = owner {
                if let Some(entity_node) = self.entities.get_mut(entity) {
                    let slots = &mut entity_node.slots;
                    for slot in [&mut slots.transform, &mut slots.mesh, &mut slots.rigidbody] {
                        if *slot == Some(component) {
                            *slot = None;
                        }
                    }
                }
            }
        }
        for child in node.children.handles() {
            if let Some(child_node) = self.components.get_mut(child) {
                child_node.owner = None;
            }
        }
        if node.component_type == ComponentType::Transform {
            for other in self.components.values_mut() {
                if let Some(ComponentBody::Transform(transform)) = other.body.as_mut() {
                    transform.remove_dependent(component);
                }
            }
        }
        debug!("Reclaimed component {} '{}'", node.identity.id(), node.identity.name());
    }
}
