//! Triangulated walkable surfaces
//!
//! A [`WalkMesh`] is an immutable manifold of counter-clockwise triangles with
//! per-vertex normals. Entities standing on it are located by a [`WalkPoint`]:
//! a triangle (as a vertex index triple) plus barycentric weights.
//!
//! Adjacency is kept as a map from each directed edge `(a, b)` to the third
//! vertex of the triangle that contains it. An interior edge appears once in
//! each direction; an edge whose reverse is missing lies on the boundary.

use std::collections::HashMap;

use super::barycentric::{barycentric_weights, interpolate};
use super::collision::Triangle;
use crate::assets::MeshError;
use crate::foundation::math::{rotation_between, Quat, Vec3, NORMALIZE_EPSILON};

/// Vertex normals whose dot with the face normal falls below this are reported
const NORMAL_AGREEMENT: f32 = 0.1;

/// Location on a walk mesh
///
/// `weights` sum to one. After an edge is reached, the edge is
/// `(indices[0], indices[1])` and `weights.z` is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkPoint {
    /// Vertex indices of the triangle, counter-clockwise
    pub indices: [u32; 3],
    /// Barycentric weights matching `indices`
    pub weights: Vec3,
}

impl WalkPoint {
    /// Create a walk point
    pub fn new(indices: [u32; 3], weights: Vec3) -> Self {
        Self { indices, weights }
    }
}

/// Result of moving within a single triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriangleStep {
    /// The whole step stayed inside the triangle
    Inside(WalkPoint),
    /// An edge was reached after `time` (in `[0, 1)`) of the step
    Edge {
        /// Point on the edge, in edge-first order
        at: WalkPoint,
        /// Fraction of the step consumed
        time: f32,
    },
}

/// Walkable triangle mesh
#[derive(Debug, Clone)]
pub struct WalkMesh {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    next_vertex: HashMap<(u32, u32), u32>,
}

impl WalkMesh {
    /// Build a walk mesh and its edge adjacency.
    ///
    /// Fails on empty geometry, mismatched normals, out-of-range indices, or
    /// a directed edge shared by two triangles. Vertex normals pointing away
    /// from their triangle are only logged.
    pub fn new(
        vertices: Vec<Vec3>,
        normals: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
    ) -> Result<Self, MeshError> {
        if triangles.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        if vertices.len() != normals.len() {
            return Err(MeshError::MismatchedNormals {
                positions: vertices.len(),
                normals: normals.len(),
            });
        }

        let mut next_vertex = HashMap::with_capacity(triangles.len() * 3);
        for (index, &[a, b, c]) in triangles.iter().enumerate() {
            for vertex in [a, b, c] {
                if vertex as usize >= vertices.len() {
                    return Err(MeshError::VertexOutOfRange {
                        triangle: index,
                        vertex,
                        count: vertices.len(),
                    });
                }
            }
            for (from, to, next) in [(a, b, c), (b, c, a), (c, a, b)] {
                if next_vertex.insert((from, to), next).is_some() {
                    return Err(MeshError::DuplicateEdge(from, to));
                }
            }
        }

        let mesh = Self {
            vertices,
            normals,
            triangles,
            next_vertex,
        };
        mesh.check_normals();
        Ok(mesh)
    }

    fn check_normals(&self) {
        for (index, tri) in self.triangles.iter().enumerate() {
            let Some(face) = self.triangle(tri).normal() else {
                log::warn!("Walk mesh triangle {} is degenerate", index);
                continue;
            };
            let disagrees = tri
                .iter()
                .any(|&v| face.dot(&self.normals[v as usize]) <= NORMAL_AGREEMENT);
            if disagrees {
                log::warn!(
                    "Walk mesh triangle {} has vertex normals inconsistent with its winding",
                    index
                );
            }
        }
    }

    /// Vertex positions
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Vertex normals
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Triangles as counter-clockwise index triples
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Position of one vertex
    pub fn vertex(&self, index: u32) -> &Vec3 {
        &self.vertices[index as usize]
    }

    fn triangle(&self, indices: &[u32; 3]) -> Triangle {
        Triangle::new(
            *self.vertex(indices[0]),
            *self.vertex(indices[1]),
            *self.vertex(indices[2]),
        )
    }

    /// Third vertex of the triangle across directed edge `(a, b)`, if any
    pub fn neighbor(&self, a: u32, b: u32) -> Option<u32> {
        self.next_vertex.get(&(b, a)).copied()
    }

    /// Whether `(a, b)` has no triangle on its far side
    pub fn is_boundary_edge(&self, a: u32, b: u32) -> bool {
        self.neighbor(a, b).is_none()
    }

    /// Walk point closest to `world_point` over all triangles
    pub fn nearest_walk_point(&self, world_point: &Vec3) -> WalkPoint {
        let mut closest = WalkPoint::new(self.triangles[0], Vec3::x());
        let mut closest_dist2 = f32::INFINITY;

        for tri in &self.triangles {
            let triangle = self.triangle(tri);
            let point = triangle.closest_point(*world_point);
            let dist2 = (world_point - point).magnitude_squared();
            if dist2 < closest_dist2 {
                closest_dist2 = dist2;
                closest = WalkPoint::new(*tri, clamped_weights(&triangle, &point));
            }
        }
        closest
    }

    /// World-space position of a walk point
    pub fn to_world_point(&self, at: &WalkPoint) -> Vec3 {
        let [a, b, c] = at.indices;
        interpolate(
            [self.vertex(a), self.vertex(b), self.vertex(c)],
            &at.weights,
        )
    }

    /// Geometric normal of the walk point's triangle
    pub fn triangle_normal(&self, at: &WalkPoint) -> Vec3 {
        self.triangle(&at.indices)
            .normal()
            .unwrap_or_else(|| self.smooth_normal(at))
    }

    /// Vertex normals blended by the walk point's weights
    pub fn smooth_normal(&self, at: &WalkPoint) -> Vec3 {
        let [a, b, c] = at.indices;
        let normals = [
            &self.normals[a as usize],
            &self.normals[b as usize],
            &self.normals[c as usize],
        ];
        interpolate(normals, &at.weights)
            .try_normalize(NORMALIZE_EPSILON)
            .unwrap_or_else(Vec3::z)
    }

    /// Move `start` by `step` without leaving its triangle.
    ///
    /// Only weights that decrease to or through zero count as crossings, so a
    /// point resting on an edge can slide along it or back into the triangle.
    /// Returns `None` for a degenerate triangle.
    pub fn walk_in_triangle(&self, start: &WalkPoint, step: &Vec3) -> Option<TriangleStep> {
        let [a, b, c] = start.indices;
        let target = self.to_world_point(start) + step;
        let end_weights =
            barycentric_weights(self.vertex(a), self.vertex(b), self.vertex(c), &target)?;

        let mut crossing: Option<(usize, f32)> = None;
        for i in 0..3 {
            let (from, to) = (start.weights[i], end_weights[i]);
            if to <= 0.0 && to < from {
                let time = (from / (from - to)).max(0.0);
                if crossing.map_or(true, |(_, best)| time < best) {
                    crossing = Some((i, time));
                }
            }
        }

        let Some((opposite, time)) = crossing.filter(|&(_, time)| time < 1.0) else {
            return Some(TriangleStep::Inside(WalkPoint::new(start.indices, end_weights)));
        };

        let weights = start.weights + (end_weights - start.weights) * time;
        let first = (opposite + 1) % 3;
        let second = (opposite + 2) % 3;
        let (w0, w1) = (weights[first].max(0.0), weights[second].max(0.0));
        let sum = w0 + w1;
        let (w0, w1) = if sum > 0.0 { (w0 / sum, w1 / sum) } else { (0.5, 0.5) };

        Some(TriangleStep::Edge {
            at: WalkPoint::new(
                [
                    start.indices[first],
                    start.indices[second],
                    start.indices[opposite],
                ],
                Vec3::new(w0, w1, 0.0),
            ),
            time,
        })
    }

    /// Step across the edge `(indices[0], indices[1])` of an edge walk point.
    ///
    /// Returns the same world point expressed on the adjacent triangle and the
    /// rotation taking the old face normal to the new one, or `None` when the
    /// edge is on the boundary.
    pub fn cross_edge(&self, at: &WalkPoint) -> Option<(WalkPoint, Quat)> {
        let [a, b, _] = at.indices;
        let across = self.neighbor(a, b)?;
        let end = WalkPoint::new([b, a, across], Vec3::new(at.weights.y, at.weights.x, 0.0));
        let rotation = rotation_between(&self.triangle_normal(at), &self.triangle_normal(&end));
        Some((end, rotation))
    }
}

/// Barycentric weights of a point on the triangle, clamped into it
fn clamped_weights(triangle: &Triangle, point: &Vec3) -> Vec3 {
    let Some(weights) = barycentric_weights(&triangle.v0, &triangle.v1, &triangle.v2, point)
    else {
        return Vec3::x();
    };
    let clamped = weights.map(|w| w.max(0.0));
    let sum = clamped.sum();
    if sum > 0.0 {
        clamped / sum
    } else {
        Vec3::x()
    }
}
