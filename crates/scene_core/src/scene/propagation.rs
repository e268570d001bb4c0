//! Transform mutation and hierarchical propagation
//!
//! Global position is `parent_global + local` when the owning entity has a
//! parent of the same kind carrying a transform, and just `local` otherwise.
//! Rotation is not inherited through entity parentage; it reaches other
//! transforms only through explicit dependents.
//!
//! Axis locks compare Euler angles re-extracted after every rotation. Near a
//! pitch of +/-90 degrees the X and Z components are degenerate (gimbal
//! lock), so corrections on those axes become unreliable there.

use std::sync::Arc;

use log::trace;

use super::graph::SceneGraph;
use crate::foundation::collections::{ComponentId, EntityId, ListenerId};
use crate::foundation::math::{self, Axis, Quat, Unit, Vec3};
use crate::transform::events::{self, TransformEvent, TransformListener};

/// Order in which locked axes are corrected after a rotation
const LOCK_ORDER: [Axis; 3] = [Axis::Z, Axis::X, Axis::Y];

impl SceneGraph {
    /// Global position of the same-kind parent's transform, if it applies
    fn inherited_origin(&self, transform: ComponentId) -> Option<Vec3> {
        let entity = self.entities.get(self.owning_entity(transform)?)?;
        let parent = self.entities.get(entity.parent?)?;
        if parent.kind != entity.kind {
            return None;
        }
        Some(self.transform(parent.slots.transform?)?.global_position())
    }

    fn recompute_global(&mut self, transform: ComponentId) {
        let Some(local) = self.transform(transform).map(|t| t.position()) else {
            return;
        };
        let global = local + self.inherited_origin(transform).unwrap_or_else(Vec3::zeros);
        if let Some(t) = self.transform_mut(transform) {
            t.set_global_position_cached(global);
        }
    }

    /// Recompute one entity's global position from its parent
    pub(crate) fn refresh_global_position(&mut self, entity: EntityId) {
        if let Some(transform) = self.transform_of(entity) {
            self.recompute_global(transform);
        }
    }

    /// Recompute the global position of an entity and all its descendants
    pub fn refresh_transform(&mut self, entity: EntityId) {
        self.refresh_global_position(entity);
        for child in self.children(entity) {
            self.refresh_transform(child);
        }
    }

    fn refresh_descendants(&mut self, transform: ComponentId) {
        if let Some(entity) = self.owning_entity(transform) {
            for child in self.children(entity) {
                self.refresh_transform(child);
            }
        }
    }

    fn broadcast(&self, transform: ComponentId, event: &TransformEvent) {
        if let Some(t) = self.transform(transform) {
            let listeners = t.listeners().snapshot();
            events::broadcast(&listeners, event);
        }
    }

    fn emit_translation(&self, transform: ComponentId) {
        if let Some(t) = self.transform(transform) {
            let event = TransformEvent::Translated {
                transform,
                position: t.position(),
                global_position: t.global_position(),
            };
            self.broadcast(transform, &event);
        }
    }

    fn emit_rotation(&self, transform: ComponentId, delta: Quat) {
        if let Some(t) = self.transform(transform) {
            let event = TransformEvent::Rotated {
                transform,
                delta,
                rotation: t.rotation(),
            };
            self.broadcast(transform, &event);
        }
    }

    /// Move a transform by `delta` in its parent's space
    pub fn translate(&mut self, transform: ComponentId, delta: Vec3) -> bool {
        let Some(position) = self.transform(transform).map(|t| t.position()) else {
            return false;
        };
        self.set_position(transform, position + delta)
    }

    /// Set a transform's local position
    ///
    /// Refreshes the global position of the transform and every descendant
    /// entity, then broadcasts a translation event.
    pub fn set_position(&mut self, transform: ComponentId, position: Vec3) -> bool {
        let Some(t) = self.transform_mut(transform) else {
            return false;
        };
        t.set_local_position(position);
        self.recompute_global(transform);
        self.refresh_descendants(transform);
        self.emit_translation(transform);
        true
    }

    /// Set a transform's global position, deriving the local one
    ///
    /// Uses the same parent rule as global position refresh. Descendants are
    /// refreshed; no event is broadcast.
    pub fn set_global_position(&mut self, transform: ComponentId, global: Vec3) -> bool {
        let origin = self.inherited_origin(transform).unwrap_or_else(Vec3::zeros);
        let Some(t) = self.transform_mut(transform) else {
            return false;
        };
        t.set_local_position(global - origin);
        t.set_global_position_cached(global);
        self.refresh_descendants(transform);
        true
    }

    /// Compose `rotation` onto a transform
    ///
    /// Broadcasts the rotation, then corrects each locked axis back to its
    /// target (each correction broadcasts again), then orbits every
    /// dependent transform around this transform's position.
    pub fn rotate(&mut self, transform: ComponentId, rotation: Quat) -> bool {
        let Some(t) = self.transform_mut(transform) else {
            return false;
        };
        let mut composed = rotation * t.rotation();
        composed.renormalize();
        t.set_rotation_raw(composed);
        let locks = t.locks();
        let pivot = t.position();
        let dependents = t.dependents().to_vec();
        self.emit_rotation(transform, rotation);

        for axis in LOCK_ORDER {
            if locks.contains(axis.into()) {
                self.correct_locked_axis(transform, axis, true);
            }
        }
        for dependent in dependents {
            if dependent != transform {
                self.rotate_around(dependent, pivot, rotation);
            }
        }
        true
    }

    /// Rotate a transform by `angle` radians about `axis`
    pub fn rotate_axis(&mut self, transform: ComponentId, axis: &Unit<Vec3>, angle: f64) -> bool {
        self.rotate(transform, Quat::from_axis_angle(axis, angle))
    }

    /// Orbit a transform's position around `point`
    ///
    /// Only the position changes; it is assigned through
    /// [`SceneGraph::set_position`], so a translation event is broadcast.
    pub fn rotate_around(&mut self, transform: ComponentId, point: Vec3, rotation: Quat) -> bool {
        let Some(position) = self.transform(transform).map(|t| t.position()) else {
            return false;
        };
        self.set_position(transform, math::rotate_about(&position, &point, &rotation))
    }

    /// Replace a transform's rotation
    ///
    /// Broadcasts the difference from the old rotation and applies that same
    /// difference to every dependent through [`SceneGraph::rotate`].
    pub fn set_rotation(&mut self, transform: ComponentId, rotation: Quat) -> bool {
        let Some(t) = self.transform_mut(transform) else {
            return false;
        };
        let mut diff = rotation * t.rotation().inverse();
        diff.renormalize();
        t.set_rotation_raw(rotation);
        let dependents = t.dependents().to_vec();
        self.emit_rotation(transform, diff);

        for dependent in dependents {
            if dependent != transform {
                self.rotate(dependent, diff);
            }
        }
        true
    }

    /// Turn a transform's forward axis toward `target`
    ///
    /// With `max_angle`, at most that many radians are turned per call.
    pub fn rotate_towards(&mut self, transform: ComponentId, target: Vec3, up: Vec3, max_angle: Option<f64>) -> bool {
        self.face(transform, target, up, max_angle, false)
    }

    /// Turn a transform's forward axis away from `target`
    pub fn rotate_away(&mut self, transform: ComponentId, target: Vec3, up: Vec3, max_angle: Option<f64>) -> bool {
        self.face(transform, target, up, max_angle, true)
    }

    fn face(&mut self, transform: ComponentId, target: Vec3, up: Vec3, max_angle: Option<f64>, away: bool) -> bool {
        let Some(t) = self.transform(transform) else {
            return false;
        };
        let mut direction = target - t.global_position();
        if away {
            direction = -direction;
        }
        let Some(desired) = math::look_rotation(&direction, &up) else {
            return false;
        };
        let current = t.rotation();

        let next = match max_angle {
            Some(max) if max >= 0.0 => {
                let angle = current.angle_to(&desired);
                if angle <= max {
                    desired
                } else {
                    current.try_slerp(&desired, max / angle, 1e-9).unwrap_or(desired)
                }
            }
            _ => desired,
        };
        self.set_rotation(transform, next)
    }

    /// Lock or unlock a rotation axis
    ///
    /// Locking captures the current Euler angle as the target.
    pub fn lock_axis(&mut self, transform: ComponentId, axis: Axis, lock: bool) -> bool {
        let Some(t) = self.transform_mut(transform) else {
            return false;
        };
        let target = if lock {
            t.euler_angles()[axis.index()]
        } else {
            t.locked_angle(axis)
        };
        t.set_lock(axis, lock, target);
        true
    }

    /// Lock a rotation axis to `radians`, correcting immediately
    ///
    /// The immediate correction is not broadcast.
    pub fn lock_axis_to(&mut self, transform: ComponentId, axis: Axis, radians: f64) -> bool {
        let Some(t) = self.transform_mut(transform) else {
            return false;
        };
        t.set_lock(axis, true, radians);
        self.correct_locked_axis(transform, axis, false);
        true
    }

    /// Rotate `axis` back to its locked target; returns whether it moved
    fn correct_locked_axis(&mut self, transform: ComponentId, axis: Axis, notify: bool) -> bool {
        let epsilon = self.axis_lock_epsilon;
        let Some(t) = self.transform_mut(transform) else {
            return false;
        };
        let rotation = t.rotation();
        let current = math::euler_angles(&rotation)[axis.index()];
        let deviation = math::wrap_angle(t.locked_angle(axis) - current);
        if deviation.abs() <= epsilon {
            return false;
        }

        let correction = math::euler_correction(&rotation, axis, deviation);
        let mut corrected = correction * rotation;
        corrected.renormalize();
        t.set_rotation_raw(corrected);
        trace!("Corrected locked {axis:?} axis by {deviation:.6} rad");
        if notify {
            self.emit_rotation(transform, correction);
        }
        true
    }

    /// Make `dependent` follow `owner`'s rotations
    pub fn attach_transform(&mut self, owner: ComponentId, dependent: ComponentId) -> bool {
        if owner == dependent || self.transform(dependent).is_none() {
            return false;
        }
        self.transform_mut(owner)
            .is_some_and(|t| t.add_dependent(dependent))
    }

    /// Stop `dependent` from following `owner`
    pub fn detach_transform(&mut self, owner: ComponentId, dependent: ComponentId) -> bool {
        self.transform_mut(owner)
            .is_some_and(|t| t.remove_dependent(dependent))
    }

    /// Register a listener on a transform
    pub fn add_transform_listener(
        &mut self,
        transform: ComponentId,
        listener: Arc<dyn TransformListener>,
    ) -> Option<ListenerId> {
        Some(self.transform_mut(transform)?.listeners_mut().add(listener))
    }

    /// Remove a listener from a transform
    pub fn remove_transform_listener(&mut self, transform: ComponentId, listener: ListenerId) -> bool {
        self.transform_mut(transform)
            .is_some_and(|t| t.listeners_mut().remove(listener))
    }

    /// Distance between the global positions of two transforms
    pub fn distance(&self, a: ComponentId, b: ComponentId) -> Option<f64> {
        Some(self.transform(a)?.distance(self.transform(b)?))
    }

    /// Squared distance between the global positions of two transforms
    pub fn square_distance(&self, a: ComponentId, b: ComponentId) -> Option<f64> {
        Some(self.transform(a)?.square_distance(self.transform(b)?))
    }
}
