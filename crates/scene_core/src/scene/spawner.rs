//! Entity spawners
//!
//! A spawner is an ordinary entity that additionally creates root entities
//! over time through a [`SpawnFactory`]. It tracks what it spawned by name:
//! a request reusing a tracked name is discarded. Spawned entities count
//! against `max_concurrent` until they are reclaimed; shutting the spawner
//! down decouples them without destroying them.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::graph::{EntityKind, Owner, SceneGraph};
use crate::component::ComponentBody;
use crate::foundation::collections::EntityId;
use crate::foundation::math::Vec3;

/// Spawn cadence and limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerSettings {
    /// Seconds between spawns; zero spawns on every update
    pub interval: f64,
    /// Maximum number of spawned entities alive at once
    pub max_concurrent: u32,
    /// Maximum number of entities ever spawned; `None` for no limit
    pub max_total: Option<u32>,
    /// Center of the spawn area
    pub origin: Vec3,
    /// Radius of the spawn area around `origin`
    pub radius: f64,
}

impl Default for SpawnerSettings {
    fn default() -> Self {
        Self {
            interval: 1.0,
            max_concurrent: 1,
            max_total: None,
            origin: Vec3::zeros(),
            radius: 0.0,
        }
    }
}

/// What the factory sees when asked for a new entity
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext {
    /// The spawner entity
    pub spawner: EntityId,
    /// Number of entities spawned so far
    pub spawned_total: u32,
    /// Center of the spawn area
    pub origin: Vec3,
    /// Radius of the spawn area
    pub radius: f64,
}

/// Description of an entity to spawn
#[derive(Debug)]
pub struct SpawnRequest {
    /// Entity name; must be unique among this spawner's live spawns
    pub name: String,
    /// Entity kind
    pub kind: EntityKind,
    /// Initial local position
    pub position: Vec3,
    /// Tags to add
    pub tags: Vec<String>,
    /// Extra components as (name, body) pairs
    pub components: Vec<(String, ComponentBody)>,
}

impl SpawnRequest {
    /// Request a bare entity of `kind` at `position`
    pub fn new(name: impl Into<String>, kind: EntityKind, position: Vec3) -> Self {
        Self {
            name: name.into(),
            kind,
            position,
            tags: Vec::new(),
            components: Vec::new(),
        }
    }

    /// Builder pattern: Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Builder pattern: Add a component
    pub fn with_component(mut self, name: impl Into<String>, body: ComponentBody) -> Self {
        self.components.push((name.into(), body));
        self
    }
}

/// Produces the entities a spawner creates
pub trait SpawnFactory: Send {
    /// Describe the next entity, or `None` to skip this opportunity
    fn create(&mut self, ctx: &SpawnContext) -> Option<SpawnRequest>;
}

/// Per-spawner bookkeeping stored on the spawner entity
pub(crate) struct SpawnerState {
    settings: SpawnerSettings,
    factory: Box<dyn SpawnFactory>,
    timer: f64,
    total: u32,
    spawned: Vec<(String, EntityId)>,
}

impl std::fmt::Debug for SpawnerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnerState")
            .field("settings", &self.settings)
            .field("timer", &self.timer)
            .field("total", &self.total)
            .field("spawned", &self.spawned.len())
            .finish()
    }
}

impl SpawnerState {
    fn can_spawn(&self) -> bool {
        self.settings.max_total.map_or(true, |max| self.total < max)
            && (self.spawned.len() as u64) < u64::from(self.settings.max_concurrent)
    }

    pub(crate) fn into_spawned(self) -> Vec<(String, EntityId)> {
        self.spawned
    }
}

impl SceneGraph {
    /// Create a spawner entity
    pub fn create_spawner(
        &mut self,
        name: &str,
        settings: SpawnerSettings,
        factory: Box<dyn SpawnFactory>,
    ) -> EntityId {
        let entity = self.create_entity(name, EntityKind::Spatial3d);
        if let Some(transform) = self.transform_of(entity) {
            self.set_position(transform, settings.origin);
        }
        if let Some(node) = self.entities.get_mut(entity) {
            node.spawner_state = Some(SpawnerState {
                settings,
                factory,
                timer: 0.0,
                total: 0,
                spawned: Vec::new(),
            });
        }
        entity
    }

    /// Spawner settings
    pub fn spawner_settings(&self, spawner: EntityId) -> Option<&SpawnerSettings> {
        Some(&self.entities.get(spawner)?.spawner_state.as_ref()?.settings)
    }

    /// Number of spawned entities still coupled to the spawner
    pub fn spawned_count(&self, spawner: EntityId) -> usize {
        self.entities
            .get(spawner)
            .and_then(|e| e.spawner_state.as_ref())
            .map_or(0, |s| s.spawned.len())
    }

    /// Total number of entities the spawner has created
    pub fn spawned_total(&self, spawner: EntityId) -> u32 {
        self.entities
            .get(spawner)
            .and_then(|e| e.spawner_state.as_ref())
            .map_or(0, |s| s.total)
    }

    /// Advance a spawner's timer and create at most one entity
    ///
    /// Returns the new root entity, if one was spawned.
    pub(crate) fn poll_spawner(&mut self, spawner: EntityId, delta: f64) -> Option<EntityId> {
        if !self.entity_updatable(spawner) {
            return None;
        }
        let state = self.entities.get_mut(spawner)?.spawner_state.as_mut()?;
        if !state.can_spawn() {
            return None;
        }
        state.timer += delta;
        let interval = state.settings.interval;
        if interval > 0.0 && state.timer < interval {
            return None;
        }
        if interval > 0.0 {
            state.timer -= interval;
        }

        let ctx = SpawnContext {
            spawner,
            spawned_total: state.total,
            origin: state.settings.origin,
            radius: state.settings.radius,
        };
        let request = state.factory.create(&ctx)?;
        if state.spawned.iter().any(|(name, _)| *name == request.name) {
            trace!("Spawner {spawner:?} discarded duplicate request '{}'", request.name);
            return None;
        }

        let entity = self.create_entity(&request.name, request.kind);
        if let Some(transform) = self.transform_of(entity) {
            self.set_position(transform, request.position);
        }
        if let Some(node) = self.entities.get_mut(entity) {
            node.spawner = Some(spawner);
            for tag in request.tags {
                node.identity.add_tag(tag);
            }
        }
        for (name, body) in request.components {
            self.add_component(Owner::Entity(entity), &name, body);
        }
        if let Some(state) = self.entities.get_mut(spawner).and_then(|e| e.spawner_state.as_mut()) {
            state.total += 1;
            state.spawned.push((request.name.clone(), entity));
        }
        debug!("Spawner {spawner:?} created '{}'", request.name);
        Some(entity)
    }

    /// Forget a spawned entity that is being reclaimed
    pub(crate) fn note_spawn_reclaimed(&mut self, spawner: EntityId, spawned: EntityId) {
        if let Some(state) = self.entities.get_mut(spawner).and_then(|e| e.spawner_state.as_mut()) {
            state.spawned.retain(|(_, e)| *e != spawned);
        }
    }

    /// Decouple every entity spawned by `spawner` without destroying them
    pub(crate) fn decouple_spawned(&mut self, spawner: EntityId) {
        let Some(state) = self.entities.get_mut(spawner).and_then(|e| e.spawner_state.as_mut()) else {
            return;
        };
        let spawned = std::mem::take(&mut state.spawned);
        for (_, entity) in spawned {
            if let Some(node) = self.entities.get_mut(entity) {
                node.spawner = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::tests::NamedFactory;

    fn settings(interval: f64, max_concurrent: u32, max_total: Option<u32>) -> SpawnerSettings {
        SpawnerSettings {
            interval,
            max_concurrent,
            max_total,
            ..SpawnerSettings::default()
        }
    }

    #[test]
    fn test_spawns_on_interval() {
        let mut graph = SceneGraph::new();
        let spawner = graph.create_spawner("s", settings(1.0, 10, None), NamedFactory::unique("enemy"));

        assert!(graph.poll_spawner(spawner, 0.5).is_none());
        let spawned = graph.poll_spawner(spawner, 0.5).unwrap();
        assert_eq!(graph.spawner_of(spawned), Some(spawner));
        assert!(graph.poll_spawner(spawner, 0.5).is_none());
        assert!(graph.poll_spawner(spawner, 0.5).is_some());
        assert_eq!(graph.spawned_total(spawner), 2);
    }

    #[test]
    fn test_zero_interval_spawns_every_poll_up_to_limits() {
        let mut graph = SceneGraph::new();
        let spawner = graph.create_spawner("s", settings(0.0, 2, Some(5)), NamedFactory::unique("enemy"));

        assert!(graph.poll_spawner(spawner, 0.0).is_some());
        assert!(graph.poll_spawner(spawner, 0.0).is_some());
        assert!(graph.poll_spawner(spawner, 0.0).is_none());
        assert_eq!(graph.spawned_count(spawner), 2);
    }

    #[test]
    fn test_duplicate_names_are_discarded() {
        let mut graph = SceneGraph::new();
        let spawner = graph.create_spawner("s", settings(0.0, 10, None), NamedFactory::fixed("boss"));

        assert!(graph.poll_spawner(spawner, 0.0).is_some());
        let before = graph.entity_count();
        assert!(graph.poll_spawner(spawner, 0.0).is_none());
        assert_eq!(graph.entity_count(), before);
        assert_eq!(graph.spawned_total(spawner), 1);
    }

    #[test]
    fn test_shutdown_decouples_spawned_entities() {
        let mut graph = SceneGraph::new();
        let spawner = graph.create_spawner("s", settings(0.0, 10, None), NamedFactory::unique("enemy"));
        let spawned = graph.poll_spawner(spawner, 0.0).unwrap();

        graph.shutdown_entity(spawner);

        assert_eq!(graph.spawner_of(spawned), None);
        assert!(!graph.entity(spawned).unwrap().identity().is_shutdown());
        assert!(graph.poll_spawner(spawner, 0.0).is_none());
    }

    #[test]
    fn test_spawn_request_applies_position_tags_and_components() {
        let mut graph = SceneGraph::new();
        let spawner = graph.create_spawner("s", settings(0.0, 10, None), NamedFactory::unique("enemy"));
        let spawned = graph.poll_spawner(spawner, 0.0).unwrap();

        let node = graph.entity(spawned).unwrap();
        assert!(node.identity().has_tag("spawned"));
        assert!(graph.mesh(spawned).is_some());
        assert_eq!(
            graph.entity_transform(spawned).unwrap().position(),
            Vec3::new(1.0, 0.0, 0.0)
        );
    }
}
