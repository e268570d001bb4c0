//! Math utilities and types
//!
//! Provides the double-precision math types used by the scene graph.
//! Spatial state is kept in `f64` so that long parent chains and repeated
//! incremental rotations do not drift the way single precision would.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, UnitQuaternion, Vector3};

use serde::{Deserialize, Serialize};

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f64>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f64>;

/// Principal axis of a transform's local frame
///
/// Forward is `+Z`, up is `+Y` and right is `+X`. Euler angles are reported
/// in the same order: `x` is the rotation about X (pitch), `y` about Y (yaw)
/// and `z` about Z (roll).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Right axis
    X,
    /// Up axis
    Y,
    /// Forward axis
    Z,
}

impl Axis {
    /// All three axes in index order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index of this axis in a `Vec3`
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Unit vector along this axis
    pub fn unit(self) -> Unit<Vec3> {
        match self {
            Axis::X => Vec3::x_axis(),
            Axis::Y => Vec3::y_axis(),
            Axis::Z => Vec3::z_axis(),
        }
    }
}

/// Euler angles of a rotation as a vector of (x, y, z) radians
///
/// Uses the `Z * Y * X` decomposition. The Y component is confined to
/// `[-pi/2, pi/2]`; near those limits X and Z become degenerate (gimbal lock)
/// and small changes in the quaternion can flip them by pi.
pub fn euler_angles(rotation: &Quat) -> Vec3 {
    let (x, y, z) = rotation.euler_angles();
    Vec3::new(x, y, z)
}

/// Rotation that changes exactly one Euler component of `rotation` by `delta`
///
/// For the `Z * Y * X` decomposition each component is isolated by a
/// different axis: X by the rotated local X axis, Y by the Y axis after the
/// Z rotation only, Z by the world Z axis. Pre-multiplying `rotation` by the
/// returned quaternion leaves the other two components unchanged (away from
/// gimbal lock).
pub fn euler_correction(rotation: &Quat, axis: Axis, delta: f64) -> Quat {
    let pivot = match axis {
        Axis::X => Unit::new_normalize(rotation * Vec3::x()),
        Axis::Y => {
            let (_, _, z) = rotation.euler_angles();
            Unit::new_normalize(Quat::from_axis_angle(&Vec3::z_axis(), z) * Vec3::y())
        }
        Axis::Z => Vec3::z_axis(),
    };
    Quat::from_axis_angle(&pivot, delta)
}

/// Rotate `point` around `pivot` by `rotation` (quaternion sandwich product)
pub fn rotate_about(point: &Vec3, pivot: &Vec3, rotation: &Quat) -> Vec3 {
    pivot + rotation.transform_vector(&(point - pivot))
}

/// Wrap an angle difference into `(-pi, pi]`
pub fn wrap_angle(radians: f64) -> f64 {
    let wrapped = (radians + constants::PI).rem_euclid(2.0 * constants::PI) - constants::PI;
    if wrapped <= -constants::PI {
        wrapped + 2.0 * constants::PI
    } else {
        wrapped
    }
}

/// Rotation whose forward axis (+Z) points along `direction`
///
/// Falls back to another up vector when `direction` is parallel to `up`.
/// Returns `None` for a zero direction.
pub fn look_rotation(direction: &Vec3, up: &Vec3) -> Option<Quat> {
    if direction.norm_squared() < f64::EPSILON {
        return None;
    }
    let up = if direction.cross(up).norm_squared() < 1e-12 {
        if direction.cross(&Vec3::z()).norm_squared() < 1e-12 {
            Vec3::y()
        } else {
            Vec3::z()
        }
    } else {
        *up
    };
    Some(Quat::face_towards(direction, &up))
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f64 = std::f64::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f64 = PI * 0.5;

    /// Full turn in radians
    pub const TAU: f64 = std::f64::consts::TAU;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f64 = PI / 180.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_euler_angles_of_single_axis_rotation() {
        let q = Quat::from_axis_angle(&Vec3::y_axis(), 0.4);
        let euler = euler_angles(&q);
        assert_relative_eq!(euler, Vec3::new(0.0, 0.4, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_euler_correction_isolates_each_component() {
        let rotation = Quat::from_euler_angles(0.3, -0.5, 1.1);

        for axis in Axis::ALL {
            let corrected = euler_correction(&rotation, axis, 0.2) * rotation;
            let mut expected = euler_angles(&rotation);
            expected[axis.index()] += 0.2;
            assert_relative_eq!(euler_angles(&corrected), expected, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_rotate_about_pivot() {
        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), constants::HALF_PI);
        let rotated = rotate_about(&Vec3::new(2.0, 0.0, 0.0), &Vec3::new(1.0, 0.0, 0.0), &rotation);

        // Rotating +X by 90 degrees about +Y yields -Z (right-handed)
        assert_relative_eq!(rotated, Vec3::new(1.0, 0.0, -1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_wrap_angle() {
        assert_relative_eq!(wrap_angle(0.5), 0.5, epsilon = EPSILON);
        assert_relative_eq!(wrap_angle(2.0 * constants::PI + 0.5), 0.5, epsilon = EPSILON);
        assert_relative_eq!(wrap_angle(-constants::PI - 0.5), constants::PI - 0.5, epsilon = EPSILON);
        assert!(wrap_angle(constants::PI) > 0.0);
    }

    #[test]
    fn test_look_rotation_points_forward_axis() {
        let direction = Vec3::new(1.0, 0.0, 1.0);
        let rotation = look_rotation(&direction, &Vec3::y()).unwrap();
        assert_relative_eq!(rotation * Vec3::z(), direction.normalize(), epsilon = EPSILON);

        let straight_up = look_rotation(&Vec3::y(), &Vec3::y()).unwrap();
        assert_relative_eq!(straight_up * Vec3::z(), Vec3::y(), epsilon = EPSILON);
        assert!(look_rotation(&Vec3::zeros(), &Vec3::y()).is_none());
    }
}
