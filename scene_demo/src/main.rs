//! Turret demo: a rotating base carries a barrel that aims at targets
//! streaming out of a spawner. Runs headless for a fixed number of frames
//! and reports what happened through the log.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use scene_core::foundation::logging;
use scene_core::foundation::math::{self, constants::TAU};
use scene_core::prelude::*;
use scene_core::scene::SpawnContext;

// Turret configuration
const TURRET_ROTATION_SPEED: f64 = 1.0; // Radians per second base yaw
const BARREL_AIM_SPEED: f64 = 2.0; // Radians per second barrel turn
const FIRE_INTERVAL: f64 = 2.0; // Seconds between shots
const BARREL_OFFSET: [f64; 3] = [0.0, 0.5, 1.2]; // Barrel mount relative to base
const ARENA_RADIUS: f64 = 60.0; // Targets leaving this radius are removed
const FRAME_TIME: f64 = 1.0 / 60.0;
const FRAMES: u32 = 60 * 30;

/// Spawns spherical targets on a ring around the turret with random velocity
struct TargetFactory {
    rng: StdRng,
}

impl SpawnFactory for TargetFactory {
    fn create(&mut self, ctx: &SpawnContext) -> Option<SpawnRequest> {
        let angle = self.rng.gen_range(0.0..TAU);
        let distance = self.rng.gen_range(ctx.radius * 0.5..ctx.radius);
        let height = self.rng.gen_range(5.0..15.0);
        let position = ctx.origin + Vec3::new(angle.cos() * distance, height, angle.sin() * distance);

        // Either circle past the turret or drift in a random direction
        let speed = self.rng.gen_range(3.0..7.0);
        let velocity = if self.rng.gen_bool(0.5) {
            let to_center = -position;
            Vec3::new(-to_center.z, 0.0, to_center.x).normalize() * speed
        } else {
            Vec3::new(
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-0.3..0.3),
                self.rng.gen_range(-1.0..1.0),
            )
            .normalize()
                * speed
        };

        Some(
            SpawnRequest::new(format!("target-{}", ctx.spawned_total), EntityKind::Spatial3d, position)
                .with_tag("target")
                .with_component("mesh", Mesh::new("sphere.obj", 0.5).into())
                .with_component(
                    "body",
                    Rigidbody {
                        velocity,
                        ..Rigidbody::default()
                    }
                    .into(),
                ),
        )
    }
}

/// Logs every rotation of the transform it is registered on
struct RotationLogger {
    label: &'static str,
}

impl TransformListener for RotationLogger {
    fn on_rotate(&self, event: &TransformEvent) {
        if let TransformEvent::Rotated { delta, .. } = event {
            log::trace!("{} rotated by {:.3} rad", self.label, delta.angle());
        }
    }
}

pub struct TurretDemoApp {
    manager: EntityManager,
    base: ComponentId,
    barrel: ComponentId,
    spawner: EntityId,
    fire_timer: f64,
    shots: u32,
    kills: u32,
}

impl TurretDemoApp {
    pub fn new(config: SceneConfig) -> SceneResult<Self> {
        log::info!("Creating turret demo application...");
        let mut manager = EntityManager::new(config)?;

        let base_entity = manager.create_entity("turret_base")?;
        let barrel_entity = manager.create_entity("turret_barrel")?;
        let settings = SpawnerSettings {
            interval: 1.5,
            max_concurrent: 4,
            max_total: Some(20),
            origin: Vec3::zeros(),
            radius: 40.0,
        };
        let factory = Box::new(TargetFactory {
            rng: StdRng::from_entropy(),
        });
        let spawner = manager.create_spawner("target_spawner", settings, factory)?;

        let setup_error = |what: &str| SceneError::InvalidConfig(format!("turret setup failed: {what}"));
        let graph = manager.graph_mut();
        graph
            .add_component(base_entity.into(), "mesh", Mesh::new("turret_base.obj", 1.0).into())
            .ok_or_else(|| setup_error("base mesh"))?;
        graph
            .add_component(barrel_entity.into(), "mesh", Mesh::new("turret_barrel.obj", 0.6).into())
            .ok_or_else(|| setup_error("barrel mesh"))?;
        let base = graph.transform_of(base_entity).ok_or_else(|| setup_error("base transform"))?;
        let barrel = graph
            .transform_of(barrel_entity)
            .ok_or_else(|| setup_error("barrel transform"))?;
        graph.set_position(barrel, Vec3::from(BARREL_OFFSET));
        if !graph.attach_transform(base, barrel) {
            return Err(setup_error("barrel dependency"));
        }
        graph
            .add_transform_listener(base, Arc::new(RotationLogger { label: "base" }))
            .ok_or_else(|| setup_error("base listener"))?;
        graph
            .add_transform_listener(barrel, Arc::new(RotationLogger { label: "barrel" }))
            .ok_or_else(|| setup_error("barrel listener"))?;

        Ok(Self {
            manager,
            base,
            barrel,
            spawner,
            fire_timer: 0.0,
            shots: 0,
            kills: 0,
        })
    }

    pub fn run(&mut self, frames: u32) {
        log::info!("Starting turret demo for {frames} frames...");
        let mut timer = Timer::new();
        for _ in 0..frames {
            self.manager.tick(FRAME_TIME);
            self.cull_escaped_targets();
            self.aim(FRAME_TIME);

            self.fire_timer += FRAME_TIME;
            if self.fire_timer >= FIRE_INTERVAL {
                self.fire_timer -= FIRE_INTERVAL;
                self.fire();
            }
            timer.update();
        }

        let stats = self.manager.stats();
        log::info!(
            "Demo finished: {} shots, {} kills, {} targets spawned, {} entities live, {} reclaimed",
            self.shots,
            self.kills,
            self.manager.graph().spawned_total(self.spawner),
            stats.entity_count,
            stats.reclaimed_entities
        );
        log::info!(
            "Simulated {:.1}s in {:.3}s wall time over {} frames",
            f64::from(frames) * FRAME_TIME,
            timer.total_time(),
            timer.frame_count()
        );
    }

    fn nearest_target(&self) -> Option<Vec3> {
        let graph = self.manager.graph();
        let origin = graph.transform(self.base)?.global_position();
        self.manager
            .find_all_with_tag("target")
            .into_iter()
            .filter(|e| graph.entity(*e).is_some_and(|n| !n.identity().is_shutdown()))
            .filter_map(|e| graph.entity_transform(e).map(Transform::global_position))
            .min_by(|a, b| (a - origin).norm_squared().total_cmp(&(b - origin).norm_squared()))
    }

    /// Yaw the base toward the nearest target, then let the barrel aim itself
    fn aim(&mut self, delta: f64) {
        let Some(target) = self.nearest_target() else {
            return;
        };
        let graph = self.manager.graph_mut();
        let Some(base) = graph.transform(self.base) else {
            return;
        };
        let to_target = target - base.global_position();
        let forward = base.forward();
        let heading = forward.x.atan2(forward.z);
        let desired = to_target.x.atan2(to_target.z);
        let max_step = TURRET_ROTATION_SPEED * delta;
        let step = math::wrap_angle(desired - heading).clamp(-max_step, max_step);
        if step.abs() > f64::EPSILON {
            graph.rotate_axis(self.base, &Vec3::y_axis(), step);
        }

        graph.rotate_towards(self.barrel, target, Vec3::y(), Some(BARREL_AIM_SPEED * delta));
    }

    fn fire(&mut self) {
        let graph = self.manager.graph();
        let Some(barrel) = graph.transform(self.barrel) else {
            return;
        };
        let ray = Ray::new(barrel.global_position(), barrel.forward());
        self.shots += 1;

        // The ray starts inside the turret's own bounds, so skip non-targets
        let hits = self.manager.raytrace(&ray, ARENA_RADIUS * 2.0);
        let graph = self.manager.graph();
        let Some(hit) = hits
            .iter()
            .find(|h| graph.entity(h.entity).is_some_and(|n| n.identity().has_tag("target")))
        else {
            log::info!("Shot {} missed", self.shots);
            return;
        };
        let entity = hit.entity;
        let name = graph
            .entity(entity)
            .map(|n| n.identity().name().to_string())
            .unwrap_or_default();
        self.manager.graph_mut().shutdown_entity(entity);
        self.kills += 1;
        log::info!("Shot {} destroyed {name} at {:.1}m", self.shots, hit.distance);
    }

    fn cull_escaped_targets(&mut self) {
        let escaped: Vec<EntityId> = self
            .manager
            .find_all_with_tag("target")
            .into_iter()
            .filter(|e| {
                self.manager
                    .graph()
                    .entity_transform(*e)
                    .is_some_and(|t| t.global_position().norm() > ARENA_RADIUS)
            })
            .collect();
        for entity in escaped {
            log::debug!("Target {entity:?} left the arena");
            self.manager.graph_mut().shutdown_entity(entity);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    logging::init();

    log::info!("Starting Turret Demo");

    let config = match std::env::args().nth(1) {
        Some(path) => SceneConfig::load_from_file(&path)?,
        None => SceneConfig::default(),
    };
    let mut app = TurretDemoApp::new(config)?;
    app.run(FRAMES);
    Ok(())
}
