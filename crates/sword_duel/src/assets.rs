//! Game asset definitions
//!
//! The arena ships built in: its meshes are encoded into the same chunked
//! format the level exporter writes and then decoded through the regular
//! loaders, so a file on disk and the built-in arena take the same path.

use std::sync::Arc;

use sword_engine::assets::mesh_library::{CollideIndexEntry, WalkIndexEntry};
use sword_engine::assets::{write_chunk, Asset, CollideMeshes, WalkMeshes};
use sword_engine::foundation::math::Vec3;
use sword_engine::physics::{ConvexMesh, WalkMesh};

use crate::config::ArenaConfig;
use crate::error::DuelError;

/// Outer radius of the built-in arena
pub const ARENA_RADIUS: f32 = 8.0;

/// Sword blade extents along its local +x, measured from the hilt
pub const BLADE: (f32, f32) = (0.2, 1.2);

/// Height of the sword hilt above the feet
pub const SHOULDER_HEIGHT: f32 = 1.0;

const RING_SEGMENTS: u32 = 6;
const RINGS: [(f32, f32); 2] = [(3.0, 0.3), (ARENA_RADIUS, 0.0)];
const CENTRE_HEIGHT: f32 = 0.6;

/// Meshes the duel needs, resolved by name
pub struct ArenaAssets {
    /// Surface every pawn walks on
    pub walk_mesh: WalkMesh,
    /// Blade collision hull
    pub sword: Arc<ConvexMesh>,
    /// Body collision hull
    pub body: Arc<ConvexMesh>,
}

impl ArenaAssets {
    /// Load from the configured files, falling back to the built-in arena
    pub fn load(config: &ArenaConfig) -> Result<Self, DuelError> {
        let walk_meshes = match &config.walk_meshes {
            Some(path) => WalkMeshes::load_file(path)?,
            None => WalkMeshes::from_bytes(&arena_walk_file())?,
        };
        let collide_meshes = match &config.collide_meshes {
            Some(path) => CollideMeshes::load_file(path)?,
            None => CollideMeshes::from_bytes(&arena_collide_file())?,
        };

        Ok(Self {
            walk_mesh: walk_meshes.lookup(&config.walk_mesh)?.clone(),
            sword: collide_meshes.lookup(&config.sword_mesh)?,
            body: collide_meshes.lookup(&config.body_mesh)?,
        })
    }
}

/// Hexagonal arena: a raised centre, a sloped inner ring and a flat rim
pub fn arena_walk_file() -> Vec<u8> {
    let mut positions = vec![[0.0, 0.0, CENTRE_HEIGHT]];
    for (radius, height) in RINGS {
        for i in 0..RING_SEGMENTS {
            let angle = std::f32::consts::TAU * i as f32 / RING_SEGMENTS as f32;
            positions.push([radius * angle.cos(), radius * angle.sin(), height]);
        }
    }

    let ring = |r: u32, i: u32| 1 + r * RING_SEGMENTS + i % RING_SEGMENTS;
    let mut triangles = Vec::new();
    for i in 0..RING_SEGMENTS {
        triangles.push([0, ring(0, i), ring(0, i + 1)]);
    }
    for r in 0..RINGS.len() as u32 - 1 {
        for i in 0..RING_SEGMENTS {
            let (a, b) = (ring(r, i), ring(r, i + 1));
            let (c, d) = (ring(r + 1, i), ring(r + 1, i + 1));
            triangles.push([a, c, d]);
            triangles.push([a, d, b]);
        }
    }

    let normals = vertex_normals(&positions, &triangles);
    let name = b"Arena";
    let index = [WalkIndexEntry {
        name_begin: 0,
        name_end: name.len() as u32,
        vertex_begin: 0,
        vertex_end: positions.len() as u32,
        triangle_begin: 0,
        triangle_end: triangles.len() as u32,
    }];

    let mut bytes = Vec::new();
    write_chunk(&mut bytes, b"p...", &positions);
    write_chunk(&mut bytes, b"n...", &normals);
    write_chunk(&mut bytes, b"tri0", &triangles);
    write_chunk(&mut bytes, b"str0", name.as_slice());
    write_chunk(&mut bytes, b"idxA", &index);
    bytes
}

/// Area-weighted average of the adjacent face normals
fn vertex_normals(positions: &[[f32; 3]], triangles: &[[u32; 3]]) -> Vec<[f32; 3]> {
    let point = |i: u32| Vec3::from(positions[i as usize]);
    let mut sums = vec![Vec3::zeros(); positions.len()];
    for &[a, b, c] in triangles {
        let face = (point(b) - point(a)).cross(&(point(c) - point(a)));
        for v in [a, b, c] {
            sums[v as usize] += face;
        }
    }
    sums.iter()
        .map(|n| {
            let n = n.try_normalize(1.0e-12).unwrap_or_else(Vec3::z);
            [n.x, n.y, n.z]
        })
        .collect()
}

/// Blade and body hulls
pub fn arena_collide_file() -> Vec<u8> {
    let blade = cuboid([BLADE.0, -0.04, -0.02], [BLADE.1, 0.04, 0.02]);
    let body = cuboid([-0.3, -0.3, 0.0], [0.3, 0.3, 1.8]);
    let positions: Vec<[f32; 3]> = blade.iter().chain(body.iter()).copied().collect();

    let index = [
        CollideIndexEntry {
            name_begin: 0,
            name_end: 5,
            vertex_begin: 0,
            vertex_end: 8,
        },
        CollideIndexEntry {
            name_begin: 5,
            name_end: 9,
            vertex_begin: 8,
            vertex_end: 16,
        },
    ];

    let mut bytes = Vec::new();
    write_chunk(&mut bytes, b"p...", &positions);
    write_chunk(&mut bytes, b"str0", b"SwordBody".as_slice());
    write_chunk(&mut bytes, b"idxA", &index);
    bytes
}

fn cuboid(min: [f32; 3], max: [f32; 3]) -> [[f32; 3]; 8] {
    let mut corners = [[0.0; 3]; 8];
    for (i, corner) in corners.iter_mut().enumerate() {
        for axis in 0..3 {
            corner[axis] = if i & (1 << axis) == 0 { min[axis] } else { max[axis] };
        }
    }
    corners
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_builtin_arena_loads() {
        let assets = ArenaAssets::load(&ArenaConfig::default()).unwrap();
        assert_eq!(assets.walk_mesh.triangles().len(), 18);
        assert_eq!(assets.sword.vertices().len(), 8);
        assert_relative_eq!(assets.body.containing_radius(), (0.18f32 + 3.24).sqrt(), epsilon = 1e-5);
    }

    #[test]
    fn test_arena_is_closed_inside_the_rim() {
        let assets = ArenaAssets::load(&ArenaConfig::default()).unwrap();
        let mesh = &assets.walk_mesh;
        // inner edges all have a neighbour; only the rim is boundary
        for &[a, b, c] in mesh.triangles() {
            for (from, to) in [(a, b), (b, c), (c, a)] {
                let on_rim = from > RING_SEGMENTS && to > RING_SEGMENTS;
                assert_eq!(mesh.is_boundary_edge(from, to), on_rim, "edge {from}-{to}");
            }
        }
    }

    #[test]
    fn test_centre_is_raised() {
        let assets = ArenaAssets::load(&ArenaConfig::default()).unwrap();
        let mesh = &assets.walk_mesh;
        let centre = mesh.to_world_point(&mesh.nearest_walk_point(&Vec3::new(0.0, 0.0, 5.0)));
        assert_relative_eq!(centre, Vec3::new(0.0, 0.0, CENTRE_HEIGHT), epsilon = 1e-5);
        let rim = mesh.nearest_walk_point(&Vec3::new(7.5, 0.0, 0.0));
        assert_relative_eq!(mesh.smooth_normal(&rim).z, 1.0, epsilon = 1e-2);
    }

    #[test]
    fn test_unknown_mesh_name_fails() {
        let config = ArenaConfig {
            sword_mesh: "Axe".to_string(),
            ..ArenaConfig::default()
        };
        assert!(matches!(ArenaAssets::load(&config), Err(DuelError::Mesh(_))));
    }
}
