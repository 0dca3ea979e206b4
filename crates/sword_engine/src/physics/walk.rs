//! Walk solver
//!
//! Slides a [`WalkPoint`] across a [`WalkMesh`] by a world-space
//! displacement. The displacement is consumed one triangle at a time: it is
//! carried over interior edges (rotated to follow the surface) and deflected
//! off boundary edges, for a bounded number of iterations.

use serde::{Deserialize, Serialize};

use super::walk_mesh::{TriangleStep, WalkMesh, WalkPoint};
use crate::foundation::math::{rotation_between, Quat, Vec3, NORMALIZE_EPSILON};

/// Tuning for [`advance`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkSettings {
    /// Triangle steps allowed per call
    pub max_iterations: u32,
    /// Scale applied when reflecting the into-wall component of a step
    pub wall_bounce: f32,
    /// Smallest lean away from a wall, as a fraction of the along-wall component
    pub wall_nudge: f32,
}

impl Default for WalkSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            wall_bounce: 1.25,
            wall_nudge: 0.01,
        }
    }
}

/// Result of one [`advance`] call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkOutcome {
    /// Final location
    pub end: WalkPoint,
    /// Displacement left over when the iteration budget ran out
    pub residual: Vec3,
    /// Triangle steps taken
    pub iterations: u32,
}

impl WalkOutcome {
    /// Whether the whole displacement was consumed
    pub fn is_complete(&self) -> bool {
        self.residual == Vec3::zeros()
    }
}

/// Move `start` by `displacement` along the surface of `mesh`
pub fn advance(
    mesh: &WalkMesh,
    start: &WalkPoint,
    displacement: &Vec3,
    settings: &WalkSettings,
) -> WalkOutcome {
    let mut at = *start;
    let mut remain = *displacement;
    let mut iterations = 0;

    while iterations < settings.max_iterations {
        if remain == Vec3::zeros() {
            break;
        }
        iterations += 1;

        let Some(step) = mesh.walk_in_triangle(&at, &remain) else {
            log::trace!("Walk stopped on degenerate triangle {:?}", at.indices);
            break;
        };
        let (edge, time) = match step {
            TriangleStep::Inside(end) => {
                at = end;
                remain = Vec3::zeros();
                break;
            }
            TriangleStep::Edge { at: edge, time } => (edge, time),
        };

        at = edge;
        remain *= 1.0 - time;

        if let Some((across, rotation)) = mesh.cross_edge(&at) {
            at = across;
            remain = rotation * remain;
        } else if !deflect_off_wall(mesh, &at, &mut remain, settings) {
            break;
        }
    }

    WalkOutcome {
        end: at,
        residual: remain,
        iterations,
    }
}

/// Bounce `remain` back into the triangle if it points out through the edge
/// `(indices[0], indices[1])`, then make sure it leans away from that edge by
/// at least `wall_nudge` times its along-wall length.
///
/// A step running exactly along the edge would otherwise re-cross it at time
/// zero through rounding and never move.
fn deflect_off_wall(mesh: &WalkMesh, at: &WalkPoint, remain: &mut Vec3, settings: &WalkSettings) -> bool {
    let a = mesh.vertex(at.indices[0]);
    let b = mesh.vertex(at.indices[1]);
    let c = mesh.vertex(at.indices[2]);

    let (Some(along), Some(normal)) = (
        (b - a).try_normalize(NORMALIZE_EPSILON),
        (b - a).cross(&(c - a)).try_normalize(NORMALIZE_EPSILON),
    ) else {
        return false;
    };
    let inward = normal.cross(&along);

    let d = remain.dot(&inward);
    if d < 0.0 {
        *remain += inward * (-settings.wall_bounce * d);
    }

    let d = remain.dot(&inward);
    let min_lean = settings.wall_nudge * (*remain - inward * d).norm();
    if d < min_lean {
        *remain += inward * (min_lean - d);
    }
    true
}

/// Re-orient `rotation` so that its local `up_axis` points along `smooth_up`
pub fn upright_rotation(rotation: &Quat, up_axis: &Vec3, smooth_up: &Vec3) -> Quat {
    let adjust = rotation_between(&(rotation * up_axis), smooth_up);
    Quat::new_normalize((adjust * rotation).into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::walk_mesh::tests::flat_square;
    use approx::assert_relative_eq;

    /// Flat half `x <= 0` hinged along `x = 0` to a half rising at 45 degrees
    fn hinged_mesh() -> WalkMesh {
        let vertices = vec![
            Vec3::new(-2.0, -2.0, 0.0),
            Vec3::new(0.0, -2.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(-2.0, 2.0, 0.0),
            Vec3::new(2.0, -2.0, 2.0),
            Vec3::new(2.0, 2.0, 2.0),
        ];
        let tilted = Vec3::new(-1.0, 0.0, 1.0).normalize();
        let normals = vec![Vec3::z(), tilted, tilted, Vec3::z(), tilted, tilted];
        let triangles = vec![[0, 1, 2], [0, 2, 3], [1, 4, 5], [1, 5, 2]];
        WalkMesh::new(vertices, normals, triangles).unwrap()
    }

    fn weights_inside(outcome: &WalkOutcome) -> bool {
        outcome.end.weights.iter().all(|&w| w >= -1e-5)
    }

    fn single_triangle() -> WalkMesh {
        let vertices = vec![Vec3::zeros(), Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 4.0, 0.0)];
        WalkMesh::new(vertices, vec![Vec3::z(); 3], vec![[0, 1, 2]]).unwrap()
    }

    #[test]
    fn test_in_triangle_displacement_is_exact() {
        let mesh = flat_square();
        let start = WalkPoint::new([0, 1, 2], Vec3::new(0.5, 0.25, 0.25));
        let displacement = Vec3::new(0.3, 0.2, 0.0);

        let outcome = advance(&mesh, &start, &displacement, &WalkSettings::default());
        assert!(outcome.is_complete());
        assert_eq!(outcome.iterations, 1);
        assert_relative_eq!(
            mesh.to_world_point(&outcome.end),
            mesh.to_world_point(&start) + displacement,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_coplanar_crossing_is_straight() {
        let mesh = flat_square();
        // (1.5, 0.5) heading up-left across the diagonal into triangle 0-2-3
        let start = mesh.nearest_walk_point(&Vec3::new(1.5, 0.5, 0.0));
        let displacement = Vec3::new(-1.0, 1.0, 0.0);

        let outcome = advance(&mesh, &start, &displacement, &WalkSettings::default());
        assert!(outcome.is_complete());
        assert_eq!(outcome.iterations, 2);
        let mut indices = outcome.end.indices;
        indices.sort_unstable();
        assert_eq!(indices, [0, 2, 3]);
        assert_relative_eq!(
            mesh.to_world_point(&outcome.end),
            Vec3::new(0.5, 1.5, 0.0),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_crossing_a_fold_follows_the_surface() {
        let mesh = hinged_mesh();
        let start = mesh.nearest_walk_point(&Vec3::new(-0.5, -1.0, 0.0));

        let outcome = advance(&mesh, &start, &Vec3::new(2.0, 0.0, 0.0), &WalkSettings::default());
        assert!(outcome.is_complete());

        // 0.5 to reach the fold, the remaining 1.5 runs up the slope
        let run = 1.5 / 2.0f32.sqrt();
        assert_relative_eq!(
            mesh.to_world_point(&outcome.end),
            Vec3::new(run, -1.0, run),
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_wall_is_never_crossed_and_sliding_continues() {
        let mesh = single_triangle();
        let start = mesh.nearest_walk_point(&Vec3::new(1.0, 1.0, 0.0));

        let outcome = advance(&mesh, &start, &Vec3::new(1.0, -2.0, 0.0), &WalkSettings::default());
        let end = mesh.to_world_point(&outcome.end);
        assert!(weights_inside(&outcome));
        assert!(end.y >= 0.0);
        assert!(end.x > 1.5);
        // hits y = 0 at x = 1.5, then (0.5, -1.0) bounces to (0.5, 0.25)
        assert_relative_eq!(end, Vec3::new(2.0, 0.25, 0.0), epsilon = 1e-5);
    }

    /// Triangle whose boundary edge 0-1 is not axis aligned
    fn slanted_triangle() -> WalkMesh {
        let vertices = vec![Vec3::zeros(), Vec3::new(3.0, 1.0, 0.0), Vec3::new(0.0, 4.0, 0.0)];
        WalkMesh::new(vertices, vec![Vec3::z(); 3], vec![[0, 1, 2]]).unwrap()
    }

    #[test]
    fn test_sliding_along_a_boundary_edge_keeps_moving() {
        let mesh = slanted_triangle();
        let along = Vec3::new(3.0, 1.0, 0.0).normalize();

        for i in 1..=17 {
            let t = i as f32 * 0.05;
            let start = WalkPoint::new([0, 1, 2], Vec3::new(1.0 - t, t, 0.0));
            let outcome = advance(&mesh, &start, &(along * 0.3), &WalkSettings::default());

            assert!(outcome.is_complete(), "stalled at t = {t}: {outcome:?}");
            assert!(weights_inside(&outcome));
            let moved = mesh.to_world_point(&outcome.end) - mesh.to_world_point(&start);
            assert_relative_eq!(moved.dot(&along), 0.3, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_repeated_slides_along_an_edge_accumulate() {
        let mesh = slanted_triangle();
        let along = Vec3::new(3.0, 1.0, 0.0).normalize();
        let start = WalkPoint::new([0, 1, 2], Vec3::new(0.9, 0.1, 0.0));

        let mut at = start;
        for _ in 0..6 {
            at = advance(&mesh, &at, &(along * 0.3), &WalkSettings::default()).end;
        }
        let moved = mesh.to_world_point(&at) - mesh.to_world_point(&start);
        assert_relative_eq!(moved.dot(&along), 1.8, epsilon = 1e-2);
    }

    #[test]
    fn test_repeated_pushes_into_a_wall_keep_sliding() {
        let mesh = single_triangle();
        let mut at = mesh.nearest_walk_point(&Vec3::new(1.0, 1.0, 0.0));
        let mut previous_x = mesh.to_world_point(&at).x;

        for tick in 0..15 {
            let outcome = advance(&mesh, &at, &Vec3::new(0.1, -0.3, 0.0), &WalkSettings::default());
            assert!(weights_inside(&outcome));
            at = outcome.end;

            let position = mesh.to_world_point(&at);
            assert!(position.y >= -1e-5, "crossed the wall on tick {tick}");
            assert!(position.x > previous_x, "stopped sliding on tick {tick}");
            previous_x = position.x;
        }
        assert!(previous_x > 2.4);
    }

    #[test]
    fn test_pushing_into_a_corner_exhausts_budget() {
        let mesh = single_triangle();
        let start = mesh.nearest_walk_point(&Vec3::new(0.5, 0.5, 0.0));
        let settings = WalkSettings {
            max_iterations: 3,
            ..WalkSettings::default()
        };

        let outcome = advance(&mesh, &start, &Vec3::new(-50.0, -50.0, 0.0), &settings);
        assert_eq!(outcome.iterations, 3);
        assert!(!outcome.is_complete());
        assert!(weights_inside(&outcome));
    }

    #[test]
    fn test_zero_displacement_does_nothing() {
        let mesh = flat_square();
        let start = WalkPoint::new([0, 1, 2], Vec3::new(0.2, 0.3, 0.5));
        let outcome = advance(&mesh, &start, &Vec3::zeros(), &WalkSettings::default());
        assert_eq!(outcome.end, start);
        assert_eq!(outcome.iterations, 0);
        assert!(outcome.is_complete());
    }

    #[test]
    fn test_upright_rotation_aligns_up_axis() {
        let rotation = Quat::from_euler_angles(0.0, 0.0, 1.2);
        let slope = Vec3::new(-1.0, 0.0, 1.0).normalize();
        let upright = upright_rotation(&rotation, &Vec3::z(), &slope);
        assert_relative_eq!(upright * Vec3::z(), slope, epsilon = 1e-5);
    }
}
