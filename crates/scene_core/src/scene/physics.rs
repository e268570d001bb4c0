//! Physics collaborator seam and ray primitives
//!
//! The scene core does not simulate physics. A collaborator is told when
//! rigidbodies enter and leave distinguished slots, and the graph offers a
//! minimal velocity integration step that moves bodies through `translate`.

use crate::foundation::collections::{ComponentId, EntityId};
use crate::foundation::math::Vec3;

use super::graph::SceneGraph;

/// Notifications sent to the physics collaborator
pub trait PhysicsHooks: Send {
    /// A rigidbody was installed in an entity's rigidbody slot
    fn add_rigidbody(&mut self, entity: EntityId, body: ComponentId);

    /// A rigidbody left an entity's rigidbody slot, or its entity shut down
    fn remove_rigidbody(&mut self, entity: EntityId, body: ComponentId);
}

/// A ray in world space
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A bounding sphere for ray queries
#[derive(Debug, Clone, Copy)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f64,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Distance along `ray` to the first intersection in front of its origin
    ///
    /// A ray starting inside the sphere hits at its exit point.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f64> {
        // Solve: |origin + t*direction - center|^2 = radius^2
        let oc = ray.origin - self.center;
        let a = ray.direction.dot(&ray.direction);
        let b = 2.0 * oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 || a == 0.0 {
            return None;
        }

        let sqrt_discriminant = discriminant.sqrt();
        let t1 = (-b - sqrt_discriminant) / (2.0 * a);
        let t2 = (-b + sqrt_discriminant) / (2.0 * a);
        if t1 >= 0.0 {
            Some(t1)
        } else if t2 >= 0.0 {
            Some(t2)
        } else {
            None
        }
    }
}

impl SceneGraph {
    /// Move every live, non-kinematic rigidbody by its velocity
    ///
    /// Goes through [`SceneGraph::translate`], so listeners and descendants
    /// see the motion like any other move.
    pub fn step_rigidbodies(&mut self, delta: f64) {
        let moving: Vec<(ComponentId, Vec3)> = self
            .entities
            .iter()
            .filter(|(_, e)| e.identity.lifecycle().is_updatable())
            .filter_map(|(id, e)| {
                let body = self.rigidbody(id)?;
                if body.kinematic || body.velocity == Vec3::zeros() {
                    return None;
                }
                Some((e.slots.transform?, body.velocity * delta))
            })
            .collect();

        for (transform, displacement) in moving {
            self.translate(transform, displacement);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Rigidbody;
    use crate::scene::EntityKind;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_sphere_hit_distance() {
        let sphere = BoundingSphere::new(Vec3::new(0.0, 0.0, 10.0), 2.0);
        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 3.0));

        assert_relative_eq!(sphere.intersect_ray(&ray).unwrap(), 8.0, epsilon = 1e-12);
        assert_relative_eq!(ray.point_at(8.0), Vec3::new(0.0, 0.0, 8.0));
    }

    #[test]
    fn test_ray_misses_sphere_behind_or_beside() {
        let behind = BoundingSphere::new(Vec3::new(0.0, 0.0, -10.0), 2.0);
        let beside = BoundingSphere::new(Vec3::new(5.0, 0.0, 10.0), 2.0);
        let ray = Ray::new(Vec3::zeros(), Vec3::z());

        assert!(behind.intersect_ray(&ray).is_none());
        assert!(beside.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_ray_from_inside_hits_exit() {
        let sphere = BoundingSphere::new(Vec3::zeros(), 3.0);
        let ray = Ray::new(Vec3::zeros(), Vec3::x());
        assert_relative_eq!(sphere.intersect_ray(&ray).unwrap(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_step_moves_dynamic_bodies_only() {
        let mut graph = SceneGraph::new();
        let dynamic = graph.create_entity("dynamic", EntityKind::Spatial3d);
        let kinematic = graph.create_entity("kinematic", EntityKind::Spatial3d);
        graph.add_component(
            dynamic.into(),
            "body",
            Rigidbody {
                velocity: Vec3::new(2.0, 0.0, 0.0),
                ..Rigidbody::default()
            }
            .into(),
        );
        graph.add_component(
            kinematic.into(),
            "body",
            Rigidbody {
                velocity: Vec3::new(2.0, 0.0, 0.0),
                kinematic: true,
                ..Rigidbody::default()
            }
            .into(),
        );

        graph.step_rigidbodies(0.5);

        assert_relative_eq!(
            graph.entity_transform(dynamic).unwrap().position(),
            Vec3::new(1.0, 0.0, 0.0)
        );
        assert_relative_eq!(graph.entity_transform(kinematic).unwrap().position(), Vec3::zeros());
    }
}
