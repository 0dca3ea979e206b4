//! Convex collision meshes
//!
//! Vertices are stored in MODEL SPACE and never modified; support queries are
//! answered in model space and mapped to world space by the caller.

use crate::assets::MeshError;
use crate::foundation::math::Vec3;

/// Immutable convex point set used by the narrow phase.
///
/// The vertices must describe a convex hull. This is assumed, not checked:
/// the farthest vertex along a direction is only a true support point of the
/// shape when the shape is convex.
#[derive(Debug, Clone)]
pub struct ConvexMesh {
    vertices: Vec<Vec3>,
    containing_radius: f32,
}

impl ConvexMesh {
    /// Build a mesh and derive its containing radius from the vertex data
    pub fn new(vertices: Vec<Vec3>) -> Result<Self, MeshError> {
        let radius = containing_radius(&vertices);
        Self::with_radius(vertices, radius)
    }

    /// Build a mesh with a radius supplied by the asset pipeline
    pub fn with_radius(vertices: Vec<Vec3>, containing_radius: f32) -> Result<Self, MeshError> {
        if vertices.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        if containing_radius.is_nan() || containing_radius < 0.0 {
            return Err(MeshError::InvalidRadius(containing_radius));
        }
        Ok(Self {
            vertices,
            containing_radius,
        })
    }

    /// Local-space vertices
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Radius of the sphere about the local origin enclosing every vertex
    pub fn containing_radius(&self) -> f32 {
        self.containing_radius
    }

    /// Vertex maximising `dot(v, direction)` (linear scan)
    pub fn farthest(&self, direction: &Vec3) -> Vec3 {
        let mut best = self.vertices[0];
        let mut best_dot = best.dot(direction);
        for vertex in &self.vertices[1..] {
            let dot = vertex.dot(direction);
            if dot > best_dot {
                best_dot = dot;
                best = *vertex;
            }
        }
        best
    }
}

/// Distance from the local origin to the farthest vertex
pub fn containing_radius(vertices: &[Vec3]) -> f32 {
    vertices
        .iter()
        .map(Vec3::magnitude_squared)
        .fold(0.0f32, f32::max)
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube(half: f32) -> ConvexMesh {
        let mut vertices = Vec::new();
        for x in [-half, half] {
            for y in [-half, half] {
                for z in [-half, half] {
                    vertices.push(Vec3::new(x, y, z));
                }
            }
        }
        ConvexMesh::new(vertices).unwrap()
    }

    #[test]
    fn test_radius_from_vertices() {
        assert_relative_eq!(cube(1.0).containing_radius(), 3.0f32.sqrt());
    }

    #[test]
    fn test_farthest_picks_extreme_vertex() {
        let mesh = cube(0.5);
        assert_eq!(mesh.farthest(&Vec3::new(1.0, 1.0, 1.0)), Vec3::new(0.5, 0.5, 0.5));
        assert_eq!(
            mesh.farthest(&Vec3::new(-1.0, 0.2, -3.0)),
            Vec3::new(-0.5, 0.5, -0.5)
        );
    }

    #[test]
    fn test_farthest_when_every_dot_is_negative() {
        // all vertices lie behind the query direction
        let mesh = ConvexMesh::new(vec![Vec3::new(-2.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0)]).unwrap();
        assert_eq!(mesh.farthest(&Vec3::x()), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_rejects_empty_and_bad_radius() {
        assert!(matches!(ConvexMesh::new(Vec::new()), Err(MeshError::EmptyMesh)));
        assert!(matches!(
            ConvexMesh::with_radius(vec![Vec3::zeros()], -1.0),
            Err(MeshError::InvalidRadius(_))
        ));
        assert!(ConvexMesh::with_radius(vec![Vec3::zeros()], f32::INFINITY).is_ok());
    }
}
