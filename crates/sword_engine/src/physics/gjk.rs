//! GJK narrow-phase intersection test
//!
//! Boolean Gilbert-Johnson-Keerthi test between two convex meshes under
//! independent transforms. Each call is self-contained: the simplex lives on
//! the stack and nothing is cached between queries, so tests of different
//! pairs never share state.
//!
//! Support points are found in each mesh's model space (the search direction
//! is pulled back through the transform) and only the two winning vertices are
//! mapped to world space.

use crate::foundation::math::{any_perpendicular, Transform, Vec3, NORMALIZE_EPSILON};
use crate::physics::collision::ConvexMesh;

/// Iteration bound after which the test gives up and reports no intersection
pub const DEFAULT_MAX_ITERATIONS: usize = 64;

/// A convex mesh placed in the world
#[derive(Debug, Clone, Copy)]
pub struct ConvexBody<'a> {
    /// Model-space geometry
    pub mesh: &'a ConvexMesh,
    /// Local-to-world placement
    pub transform: &'a Transform,
}

impl<'a> ConvexBody<'a> {
    /// Pair a mesh with its current transform
    pub fn new(mesh: &'a ConvexMesh, transform: &'a Transform) -> Self {
        Self { mesh, transform }
    }

    /// World-space vertex of this body farthest along a world direction
    fn support(&self, direction: &Vec3) -> Vec3 {
        let local_direction = self.transform.pull_back_direction(direction);
        self.transform
            .transform_point(&self.mesh.farthest(&local_direction))
    }
}

/// Whether two convex bodies overlap, with the default iteration bound
pub fn intersects(a: ConvexBody<'_>, b: ConvexBody<'_>) -> bool {
    intersects_with_limit(a, b, DEFAULT_MAX_ITERATIONS)
}

/// Whether two convex bodies overlap.
///
/// Touching counts as overlapping. Running out of iterations, or meeting a
/// degenerate simplex, reports no intersection.
pub fn intersects_with_limit(a: ConvexBody<'_>, b: ConvexBody<'_>, max_iterations: usize) -> bool {
    let support = |direction: &Vec3| a.support(direction) - b.support(&-direction);

    let toward_b = b.transform.position - a.transform.position;
    let initial = toward_b
        .try_normalize(NORMALIZE_EPSILON)
        .unwrap_or_else(Vec3::x);

    let first = support(&initial);
    let Some(mut direction) = (-first).try_normalize(NORMALIZE_EPSILON) else {
        // the origin is itself a support point of the difference
        return true;
    };
    let mut simplex = Simplex::new(first);

    for _ in 0..max_iterations {
        let next = support(&direction);
        if next.dot(&direction) < 0.0 {
            return false;
        }
        simplex.push(next);

        match simplex.evolve() {
            Evolution::Search(next_direction) => direction = next_direction,
            Evolution::ContainsOrigin => return true,
            Evolution::Degenerate => {
                log::trace!("GJK simplex degenerated after {} points", simplex.len);
                return false;
            }
        }
    }

    log::trace!("GJK gave up after {} iterations", max_iterations);
    false
}

/// Outcome of reducing the simplex after a support point was added
enum Evolution {
    /// Keep searching along this unit direction
    Search(Vec3),
    /// The tetrahedron encloses the origin
    ContainsOrigin,
    /// A face or direction collapsed to zero length
    Degenerate,
}

/// Up to four Minkowski-difference points, oldest first
struct Simplex {
    points: [Vec3; 4],
    len: usize,
}

impl Simplex {
    fn new(first: Vec3) -> Self {
        Self {
            points: [first, Vec3::zeros(), Vec3::zeros(), Vec3::zeros()],
            len: 1,
        }
    }

    fn push(&mut self, point: Vec3) {
        self.points[self.len] = point;
        self.len += 1;
    }

    fn set(&mut self, points: &[Vec3]) {
        self.points[..points.len()].copy_from_slice(points);
        self.len = points.len();
    }

    fn evolve(&mut self) -> Evolution {
        match self.len {
            2 => self.line(),
            3 => self.triangle(),
            4 => self.tetrahedron(),
            _ => Evolution::Degenerate,
        }
    }

    fn line(&self) -> Evolution {
        let [b, a, ..] = self.points;
        let ab = b - a;
        let ao = -a;

        let toward_origin = ab.cross(&ao.cross(&ab));
        match toward_origin.try_normalize(NORMALIZE_EPSILON) {
            Some(direction) => Evolution::Search(direction),
            // origin lies on the segment; any sideways direction makes progress
            None => Evolution::Search(any_perpendicular(&ab)),
        }
    }

    fn triangle(&self) -> Evolution {
        let [c, b, a, _] = self.points;
        let ao = -a;

        let Some(mut normal) = (c - a).cross(&(b - a)).try_normalize(NORMALIZE_EPSILON) else {
            return Evolution::Degenerate;
        };
        if normal.dot(&ao) < 0.0 {
            normal = -normal;
        }
        Evolution::Search(normal)
    }

    fn tetrahedron(&mut self) -> Evolution {
        let [d, c, b, a] = self.points;
        let ao = -a;

        // the three faces touching the newest point, each with the vertex it leaves out
        let faces = [(c, d, b), (b, d, c), (b, c, d)];
        for (x, y, excluded) in faces {
            let Some(normal) = outward_normal(a, x, y, excluded) else {
                return Evolution::Degenerate;
            };
            if normal.dot(&ao) > 0.0 {
                self.set(&[x, y, a]);
                return Evolution::Search(normal);
            }
        }
        Evolution::ContainsOrigin
    }
}

/// Unit normal of face (a, x, y) pointing away from `excluded`
fn outward_normal(a: Vec3, x: Vec3, y: Vec3, excluded: Vec3) -> Option<Vec3> {
    let normal = (x - a).cross(&(y - a)).try_normalize(NORMALIZE_EPSILON)?;
    if normal.dot(&(excluded - a)) > 0.0 {
        Some(-normal)
    } else {
        Some(normal)
    }
}
