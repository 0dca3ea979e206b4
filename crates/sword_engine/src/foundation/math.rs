//! Math utilities and types
//!
//! Provides the fundamental math types shared by the walk solver and the
//! collision engine.

pub use nalgebra::{Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Quaternion type for rotations
pub type Quat = nalgebra::UnitQuaternion<f32>;

/// Tolerance used when deciding whether a vector is too short to normalize
pub const NORMALIZE_EPSILON: f32 = 1.0e-12;

/// Transform representing position, rotation, and scale
///
/// Applied in TRS order: a local point is scaled, then rotated, then translated.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Map a local-space point to world space
    pub fn transform_point(&self, point: &Vec3) -> Vec3 {
        self.position + self.rotation * self.scale.component_mul(point)
    }

    /// Pull a world-space direction back into local space for support queries.
    ///
    /// This is the transpose of the scale-then-rotate part of
    /// [`Self::transform_point`], so `dot(local, pulled)` equals the dot of the
    /// mapped local vector with `world_dir`. It is not the inverse mapping
    /// unless the scale is one.
    pub fn pull_back_direction(&self, world_dir: &Vec3) -> Vec3 {
        self.scale.component_mul(&(self.rotation.inverse() * world_dir))
    }

    /// Largest absolute scale factor, used to grow bounding radii
    pub fn max_scale(&self) -> f32 {
        self.scale.x.abs().max(self.scale.y.abs()).max(self.scale.z.abs())
    }
}

/// Returns a unit vector perpendicular to `v` (or +X for a zero vector)
pub fn any_perpendicular(v: &Vec3) -> Vec3 {
    // cross with the axis least aligned with v
    let axis = if v.x.abs() <= v.y.abs() && v.x.abs() <= v.z.abs() {
        Vec3::x()
    } else if v.y.abs() <= v.z.abs() {
        Vec3::y()
    } else {
        Vec3::z()
    };
    v.cross(&axis)
        .try_normalize(NORMALIZE_EPSILON)
        .unwrap_or_else(Vec3::x)
}

/// Shortest rotation taking direction `from` onto direction `to`.
///
/// Unlike `UnitQuaternion::rotation_between` this never fails: zero-length
/// inputs give the identity and opposite inputs give a half turn about some
/// axis perpendicular to `from`.
pub fn rotation_between(from: &Vec3, to: &Vec3) -> Quat {
    let (Some(from), Some(to)) = (
        from.try_normalize(NORMALIZE_EPSILON),
        to.try_normalize(NORMALIZE_EPSILON),
    ) else {
        return Quat::identity();
    };

    Quat::rotation_between(&from, &to).unwrap_or_else(|| {
        let axis = Unit::new_unchecked(any_perpendicular(&from));
        Quat::from_axis_angle(&axis, std::f32::consts::PI)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_transform_point_scales_then_rotates_then_translates() {
        let transform = Transform {
            position: Vec3::new(1.0, -2.0, 3.0),
            rotation: Quat::from_euler_angles(0.0, 0.0, std::f32::consts::FRAC_PI_2),
            scale: Vec3::new(2.0, 0.5, 1.5),
        };
        // (1, 2, 2) -> scaled (2, 1, 3) -> quarter turn about z (-1, 2, 3)
        let world = transform.transform_point(&Vec3::new(1.0, 2.0, 2.0));
        assert_relative_eq!(world, Vec3::new(0.0, 0.0, 6.0), epsilon = EPSILON);
    }

    #[test]
    fn test_pull_back_direction_preserves_dot_products() {
        let transform = Transform {
            position: Vec3::new(5.0, 0.0, 0.0),
            rotation: Quat::from_euler_angles(-0.4, 0.2, 2.0),
            scale: Vec3::new(3.0, 1.0, 0.5),
        };
        let world_dir = Vec3::new(0.3, -1.0, 0.8);
        let local = Vec3::new(-2.0, 0.5, 1.0);

        let mapped = transform.transform_point(&local) - transform.position;
        let world_dot = mapped.dot(&world_dir);
        let local_dot = local.dot(&transform.pull_back_direction(&world_dir));
        assert_relative_eq!(world_dot, local_dot, epsilon = EPSILON);
    }

    #[test]
    fn test_rotation_between_handles_degenerate_inputs() {
        assert_eq!(rotation_between(&Vec3::zeros(), &Vec3::z()), Quat::identity());

        let up = Vec3::z();
        let half_turn = rotation_between(&up, &-up);
        assert_relative_eq!(half_turn * up, -up, epsilon = EPSILON);

        let tilted = Vec3::new(0.0, 1.0, 1.0);
        let rotation = rotation_between(&up, &tilted);
        assert_relative_eq!(rotation * up, tilted.normalize(), epsilon = EPSILON);
    }

    #[test]
    fn test_any_perpendicular() {
        for v in [Vec3::x(), Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 0.0, -4.0)] {
            let p = any_perpendicular(&v);
            assert_relative_eq!(p.dot(&v), 0.0, epsilon = EPSILON);
            assert_relative_eq!(p.norm(), 1.0, epsilon = EPSILON);
        }
    }
}
