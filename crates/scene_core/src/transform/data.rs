//! Transform component data
//!
//! Local position is authoritative; the global position is derived from the
//! owning entity's parent chain by the scene graph and cached here. Rotation
//! and scale are not inherited through entity parentage. Rotation follows
//! explicitly attached dependents instead (see `SceneGraph::attach_transform`).

use bitflags::bitflags;

use super::events::ListenerSet;
use crate::foundation::collections::ComponentId;
use crate::foundation::math::{self, Axis, Mat4, Quat, Vec3};

bitflags! {
    /// Set of rotation axes pinned to a target Euler angle
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AxisLocks: u8 {
        /// Pitch
        const X = 1 << 0;
        /// Yaw
        const Y = 1 << 1;
        /// Roll
        const Z = 1 << 2;
    }
}

impl From<Axis> for AxisLocks {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::X => Self::X,
            Axis::Y => Self::Y,
            Axis::Z => Self::Z,
        }
    }
}

/// Spatial state of an entity
#[derive(Debug)]
pub struct Transform {
    position: Vec3,
    global_position: Vec3,
    rotation: Quat,
    scale: Vec3,
    locks: AxisLocks,
    locked_angles: Vec3,
    dependents: Vec<ComponentId>,
    listeners: ListenerSet,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            global_position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            locks: AxisLocks::empty(),
            locked_angles: Vec3::zeros(),
            dependents: Vec::new(),
            listeners: ListenerSet::default(),
        }
    }
}

impl Transform {
    /// Identity transform at the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from position only
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            global_position: position,
            ..Default::default()
        }
    }

    /// Builder pattern: Set rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder pattern: Set rotation from Euler angles (radians)
    pub fn with_rotation_euler(mut self, x: f64, y: f64, z: f64) -> Self {
        self.rotation = Quat::from_euler_angles(x, y, z);
        self
    }

    /// Builder pattern: Set scale (non-uniform)
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local position relative to the parent entity
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Cached world position
    pub fn global_position(&self) -> Vec3 {
        self.global_position
    }

    /// Rotation
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Rotation as Euler angles in radians
    pub fn euler_angles(&self) -> Vec3 {
        math::euler_angles(&self.rotation)
    }

    /// Scale factors
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Set per-axis scale
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Set the same scale on every axis
    pub fn set_uniform_scale(&mut self, scale: f64) {
        self.scale = Vec3::new(scale, scale, scale);
    }

    /// Currently locked axes
    pub fn locks(&self) -> AxisLocks {
        self.locks
    }

    /// Whether `axis` is locked
    pub fn is_axis_locked(&self, axis: Axis) -> bool {
        self.locks.contains(axis.into())
    }

    /// Target Euler angle of `axis` in radians
    pub fn locked_angle(&self, axis: Axis) -> f64 {
        self.locked_angles[axis.index()]
    }

    /// Local forward direction (+Z) in world space
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::z()
    }

    /// Local up direction (+Y) in world space
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::y()
    }

    /// Local right direction (+X) in world space
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::x()
    }

    /// Distance between the global positions of two transforms
    pub fn distance(&self, other: &Transform) -> f64 {
        (self.global_position - other.global_position).norm()
    }

    /// Squared distance between the global positions of two transforms
    pub fn square_distance(&self, other: &Transform) -> f64 {
        (self.global_position - other.global_position).norm_squared()
    }

    /// World matrix in TRS order from the global position
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.global_position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Transforms rotated along with this one
    pub fn dependents(&self) -> &[ComponentId] {
        &self.dependents
    }

    /// Registered listeners
    pub fn listeners(&self) -> &ListenerSet {
        &self.listeners
    }

    pub(crate) fn listeners_mut(&mut self) -> &mut ListenerSet {
        &mut self.listeners
    }

    pub(crate) fn set_local_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub(crate) fn set_global_position_cached(&mut self, global: Vec3) {
        self.global_position = global;
    }

    pub(crate) fn set_rotation_raw(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    pub(crate) fn set_lock(&mut self, axis: Axis, locked: bool, target: f64) {
        self.locks.set(axis.into(), locked);
        self.locked_angles[axis.index()] = target;
    }

    pub(crate) fn add_dependent(&mut self, dependent: ComponentId) -> bool {
        if self.dependents.contains(&dependent) {
            return false;
        }
        self.dependents.push(dependent);
        true
    }

    pub(crate) fn remove_dependent(&mut self, dependent: ComponentId) -> bool {
        let before = self.dependents.len();
        self.dependents.retain(|d| *d != dependent);
        self.dependents.len() != before
    }
}
