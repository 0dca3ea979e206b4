//! Barycentric coordinates on triangle planes

use crate::foundation::math::Vec3;

/// Project `point` onto the plane of triangle `(a, b, c)` and return the
/// barycentric weights of the projection.
///
/// Weights always sum to one. They are negative for a projection outside the
/// triangle. Returns `None` when the triangle has no area.
pub fn barycentric_weights(a: &Vec3, b: &Vec3, c: &Vec3, point: &Vec3) -> Option<Vec3> {
    let ab = b - a;
    let ac = c - a;
    let normal = ab.cross(&ac);
    let normal2 = normal.magnitude_squared();
    if normal2 <= f32::MIN_POSITIVE {
        return None;
    }

    let ap = point - a;
    let weight_b = ap.cross(&ac).dot(&normal) / normal2;
    let weight_c = ab.cross(&ap).dot(&normal) / normal2;
    Some(Vec3::new(1.0 - (weight_b + weight_c), weight_b, weight_c))
}

/// Blend three values by barycentric weights
pub fn interpolate(values: [&Vec3; 3], weights: &Vec3) -> Vec3 {
    values[0] * weights.x + values[1] * weights.y + values[2] * weights.z
}
