//! # Entity Manager
//!
//! Owner of the scene graph and the frame loop around it. The manager keeps
//! the set of entities it created, drives variable and fixed-rate updates on
//! the active roots, runs spawners, periodically sweeps zombies, and answers
//! scene-wide queries (name/tag lookup, raytrace, render snapshot).

use log::{debug, info, trace, warn};

use super::graph::{EntityKind, SceneGraph};
use super::physics::{BoundingSphere, Ray};
use super::render::RenderRecord;
use super::spawner::{SpawnFactory, SpawnerSettings};
use super::sweep::SweepReport;
use crate::config::SceneConfig;
use crate::error::{SceneError, SceneResult};
use crate::foundation::collections::EntityId;
use crate::foundation::time::FixedTimestep;
use crate::object::PinGuard;

/// Entities carrying this tag are ignored by [`EntityManager::raytrace`]
pub const RAYCAST_IGNORE_TAG: &str = "terrain";

/// Counters describing the managed scene
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneStats {
    /// Entities registered with the manager
    pub entity_count: usize,

    /// Registered entities without a parent
    pub root_count: usize,

    /// Components in the arena, including zombies
    pub component_count: usize,

    /// Registered spawners
    pub spawner_count: usize,

    /// Fixed updates run so far
    pub fixed_ticks: u64,

    /// Entities reclaimed over the manager's lifetime
    pub reclaimed_entities: u64,
}

/// A raytrace hit, pinning the entity it refers to
#[derive(Debug, Clone)]
pub struct RaycastHit {
    /// Entity that was hit
    pub entity: EntityId,
    /// Distance along the ray to the bounding sphere
    pub distance: f64,
    /// Pin held for as long as the hit lives
    pub pin: PinGuard,
}

/// High-level owner of the scene graph
pub struct EntityManager {
    graph: SceneGraph,
    config: SceneConfig,
    registered: Vec<EntityId>,
    spawners: Vec<EntityId>,
    clock: FixedTimestep,
    stats: SceneStats,
}

impl EntityManager {
    /// Create a manager with a validated configuration
    pub fn new(config: SceneConfig) -> SceneResult<Self> {
        config.validate().map_err(SceneError::InvalidConfig)?;

        let mut graph = SceneGraph::new();
        graph.set_axis_lock_epsilon(config.axis_lock_epsilon);
        let clock = FixedTimestep::new(config.fixed_timestep, config.max_fixed_steps_per_tick);
        info!(
            "Entity manager ready (max {} entities, fixed step {:.4}s)",
            config.max_entities, config.fixed_timestep
        );

        Ok(Self {
            graph,
            config,
            registered: Vec::new(),
            spawners: Vec::new(),
            clock,
            stats: SceneStats::default(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// The scene graph
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Mutable access to the scene graph
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Registered entities in creation order
    pub fn entities(&self) -> &[EntityId] {
        &self.registered
    }

    /// Create a 3D entity
    pub fn create_entity(&mut self, name: &str) -> SceneResult<EntityId> {
        self.create_entity_of_kind(name, EntityKind::Spatial3d)
    }

    /// Create an entity of the given kind
    pub fn create_entity_of_kind(&mut self, name: &str, kind: EntityKind) -> SceneResult<EntityId> {
        self.check_capacity()?;
        let entity = self.graph.create_entity(name, kind);
        self.registered.push(entity);
        Ok(entity)
    }

    /// Create a spawner entity
    pub fn create_spawner(
        &mut self,
        name: &str,
        settings: SpawnerSettings,
        factory: Box<dyn SpawnFactory>,
    ) -> SceneResult<EntityId> {
        self.check_capacity()?;
        let spawner = self.graph.create_spawner(name, settings, factory);
        self.registered.push(spawner);
        self.spawners.push(spawner);
        Ok(spawner)
    }

    /// Register an entity that lives in the graph but not in this manager
    ///
    /// Returns `false` if the entity is gone, shut down or already registered.
    pub fn add_entity(&mut self, entity: EntityId) -> bool {
        let Some(node) = self.graph.entity(entity) else {
            return false;
        };
        if node.identity().is_shutdown() || self.registered.contains(&entity) {
            return false;
        }
        if node.is_spawner() {
            self.spawners.push(entity);
        }
        self.registered.push(entity);
        true
    }

    fn check_capacity(&self) -> SceneResult<()> {
        if self.graph.entity_count() >= self.config.max_entities {
            warn!("Entity capacity of {} reached", self.config.max_entities);
            return Err(SceneError::CapacityExceeded(self.config.max_entities));
        }
        Ok(())
    }

    fn active_roots(&self) -> Vec<EntityId> {
        self.registered
            .iter()
            .copied()
            .filter(|e| self.graph.parent(*e).is_none())
            .collect()
    }

    /// Variable-rate update of every active root, then spawners
    pub fn update(&mut self, delta: f64) {
        for root in self.active_roots() {
            self.graph.update_entity(root, delta);
        }

        for spawner in self.spawners.clone() {
            if self.graph.entity_count() >= self.config.max_entities {
                trace!("Skipping spawners at capacity");
                break;
            }
            if let Some(spawned) = self.graph.poll_spawner(spawner, delta) {
                self.registered.push(spawned);
            }
        }
    }

    /// Fixed-rate update: integrate rigidbodies, update active roots and
    /// sweep every `sweep_interval` ticks
    pub fn fixed_update(&mut self, delta: f64) {
        self.graph.step_rigidbodies(delta);
        for root in self.active_roots() {
            self.graph.fixed_update_entity(root, delta);
        }

        self.stats.fixed_ticks += 1;
        let interval = u64::from(self.config.sweep_interval);
        if interval > 0 && self.stats.fixed_ticks % interval == 0 {
            self.sweep();
        }
    }

    /// Advance the frame clock by `delta` seconds
    ///
    /// Runs as many fixed updates as the accumulator allows, followed by one
    /// variable update. Returns the number of fixed steps taken.
    pub fn tick(&mut self, delta: f64) -> u32 {
        let steps = self.clock.advance(delta);
        let step = self.clock.step();
        for _ in 0..steps {
            self.fixed_update(step);
        }
        self.update(delta);
        steps
    }

    /// Interpolation factor between the last two fixed steps
    pub fn interpolation_alpha(&self) -> f64 {
        self.clock.alpha()
    }

    /// Reclaim shut-down, unpinned nodes
    pub fn sweep(&mut self) -> SweepReport {
        let report = self.graph.sweep();
        self.forget_reclaimed(&report);
        report
    }

    /// Reclaim every shut-down node now, refusing pinned ones
    pub fn destroy_all_shutdown(&mut self) -> SceneResult<SweepReport> {
        let result = self.graph.destroy_all_shutdown();
        let graph = &self.graph;
        let before = self.registered.len();
        self.registered.retain(|e| graph.contains_entity(*e));
        self.spawners.retain(|e| graph.contains_entity(*e));
        self.stats.reclaimed_entities += (before - self.registered.len()) as u64;
        result
    }

    fn forget_reclaimed(&mut self, report: &SweepReport) {
        if report.entities.is_empty() {
            return;
        }
        self.registered.retain(|e| !report.entities.contains(e));
        self.spawners.retain(|e| !report.entities.contains(e));
        self.stats.reclaimed_entities += report.entities.len() as u64;
    }

    /// Shut down every registered entity named `name`; returns how many
    pub fn shutdown_with_name(&mut self, name: &str) -> usize {
        let matches: Vec<EntityId> = self
            .registered
            .iter()
            .copied()
            .filter(|e| self.graph.entity(*e).is_some_and(|n| n.identity().name() == name))
            .collect();
        for entity in &matches {
            self.graph.shutdown_entity(*entity);
        }
        matches.len()
    }

    /// Shut down every registered entity
    pub fn shutdown_all(&mut self) {
        debug!("Shutting down all {} entities", self.registered.len());
        for entity in self.registered.clone() {
            self.graph.shutdown_entity(entity);
        }
    }

    /// Shut down every registered entity that is inactive; returns how many
    pub fn shutdown_inactive(&mut self) -> usize {
        let inactive: Vec<EntityId> = self
            .registered
            .iter()
            .copied()
            .filter(|e| {
                self.graph
                    .entity(*e)
                    .is_some_and(|n| !n.identity().is_active() && !n.identity().is_shutdown())
            })
            .collect();
        for entity in &inactive {
            self.graph.shutdown_entity(*entity);
        }
        inactive.len()
    }

    /// First registered entity named `name`
    pub fn find_with_name(&self, name: &str) -> Option<EntityId> {
        self.registered
            .iter()
            .copied()
            .find(|e| self.graph.entity(*e).is_some_and(|n| n.identity().name() == name))
    }

    /// Registered entities carrying `tag`
    pub fn find_all_with_tag(&self, tag: &str) -> Vec<EntityId> {
        self.registered
            .iter()
            .copied()
            .filter(|e| self.graph.entity(*e).is_some_and(|n| n.identity().has_tag(tag)))
            .collect()
    }

    /// Cast `ray` against the bounding spheres of active mesh entities
    ///
    /// Spheres whose nearest hit lies beyond `max_distance` are skipped.
    /// Hits come back nearest first, each pinning its entity.
    pub fn raytrace(&self, ray: &Ray, max_distance: f64) -> Vec<RaycastHit> {
        let mut hits = Vec::new();
        for &entity in &self.registered {
            let Some(node) = self.graph.entity(entity) else {
                continue;
            };
            if !node.identity().lifecycle().is_updatable() || node.identity().has_tag(RAYCAST_IGNORE_TAG) {
                continue;
            }
            let Some(mesh_id) = self.graph.mesh_of(entity) else {
                continue;
            };
            let mesh_live = self
                .graph
                .component(mesh_id)
                .is_some_and(|c| c.identity().lifecycle().is_updatable());
            let (Some(mesh), Some(transform)) = (self.graph.mesh(entity), self.graph.entity_transform(entity))
            else {
                continue;
            };
            if !mesh_live {
                continue;
            }

            let radius = mesh.bounding_radius * transform.scale().amax();
            let reach = max_distance + radius;
            if (transform.global_position() - ray.origin).norm_squared() > reach * reach {
                continue;
            }
            let sphere = BoundingSphere::new(transform.global_position(), radius);
            let Some(distance) = sphere.intersect_ray(ray).filter(|d| *d <= max_distance) else {
                continue;
            };
            match PinGuard::acquire(node.identity().lifecycle_handle()) {
                Ok(pin) => hits.push(RaycastHit { entity, distance, pin }),
                Err(err) => warn!("Skipping raytrace hit: {err}"),
            }
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        trace!("Raytrace found {} hits", hits.len());
        hits
    }

    /// Pinned records of every visible mesh entity for the renderer
    pub fn render_snapshot(&self) -> Vec<RenderRecord> {
        self.graph.render_snapshot()
    }

    /// Current scene counters
    pub fn stats(&self) -> SceneStats {
        SceneStats {
            entity_count: self.registered.len(),
            root_count: self
                .registered
                .iter()
                .filter(|e| self.graph.parent(**e).is_none())
                .count(),
            component_count: self.graph.component_count(),
            spawner_count: self.spawners.len(),
            ..self.stats.clone()
        }
    }
}
