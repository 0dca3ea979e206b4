//! Named mesh libraries
//!
//! One exported file holds many sub-meshes sharing flat position, normal and
//! triangle arrays. An index chunk slices those arrays per sub-mesh; triangle
//! indices are stored file-global and rebased to the sub-mesh on load.
//!
//! Walk mesh file chunks, in order:
//!
//! | magic  | element    | contents                                   |
//! |--------|------------|--------------------------------------------|
//! | `p...` | `[f32; 3]` | positions                                  |
//! | `n...` | `[f32; 3]` | normals                                    |
//! | `tri0` | `[u32; 3]` | triangles                                  |
//! | `str0` | `u8`       | UTF-8 names, concatenated                  |
//! | `idxA` | `[u32; 6]` | name, vertex and triangle ranges           |
//!
//! Collision mesh files carry `p...`, `str0`, an optional `rad0` (one `f32`
//! containing radius per index entry) and an `idxA` of `[u32; 4]` name and
//! vertex ranges.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use super::chunk::ChunkReader;
use super::{Asset, MeshError};
use crate::foundation::math::Vec3;
use crate::physics::collision::ConvexMesh;
use crate::physics::walk_mesh::WalkMesh;

/// Index record of a walk mesh file
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct WalkIndexEntry {
    /// First name byte
    pub name_begin: u32,
    /// One past the last name byte
    pub name_end: u32,
    /// First vertex
    pub vertex_begin: u32,
    /// One past the last vertex
    pub vertex_end: u32,
    /// First triangle
    pub triangle_begin: u32,
    /// One past the last triangle
    pub triangle_end: u32,
}

/// Index record of a collision mesh file
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct CollideIndexEntry {
    /// First name byte
    pub name_begin: u32,
    /// One past the last name byte
    pub name_end: u32,
    /// First vertex
    pub vertex_begin: u32,
    /// One past the last vertex
    pub vertex_end: u32,
}

/// All walk meshes of one file, by name
#[derive(Debug, Clone, Default)]
pub struct WalkMeshes {
    meshes: HashMap<String, WalkMesh>,
}

impl WalkMeshes {
    /// Walk mesh called `name`
    pub fn lookup(&self, name: &str) -> Result<&WalkMesh, MeshError> {
        self.meshes
            .get(name)
            .ok_or_else(|| MeshError::NotFound(name.to_string()))
    }

    /// Names of all loaded meshes
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.meshes.keys().map(String::as_str)
    }

    /// Number of loaded meshes
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Whether the file held no meshes
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl Asset for WalkMeshes {
    fn from_bytes(bytes: &[u8]) -> Result<Self, MeshError> {
        let mut reader = ChunkReader::parse(bytes)?;
        let positions: Vec<[f32; 3]> = reader.expect(b"p...")?;
        let normals: Vec<[f32; 3]> = reader.expect(b"n...")?;
        let triangles: Vec<[u32; 3]> = reader.expect(b"tri0")?;
        let names: Vec<u8> = reader.expect(b"str0")?;
        let index: Vec<WalkIndexEntry> = reader.expect(b"idxA")?;
        if reader.has_trailing_data() {
            log::warn!("Trailing data in walk mesh file");
        }

        if positions.len() != normals.len() {
            return Err(MeshError::MismatchedNormals {
                positions: positions.len(),
                normals: normals.len(),
            });
        }

        let mut meshes = HashMap::with_capacity(index.len());
        for (entry, e) in index.iter().enumerate() {
            let name = name_at(&names, entry, e.name_begin, e.name_end)?;
            let vertices = checked_range(e.vertex_begin, e.vertex_end, positions.len())
                .ok_or(MeshError::InvalidVertexRange {
                    entry,
                    begin: e.vertex_begin,
                    end: e.vertex_end,
                })?;
            let tris = checked_range(e.triangle_begin, e.triangle_end, triangles.len())
                .ok_or(MeshError::InvalidTriangleRange {
                    entry,
                    begin: e.triangle_begin,
                    end: e.triangle_end,
                })?;

            let mut local = Vec::with_capacity(tris.len());
            for triangle in tris {
                let rebased = rebase(&triangles[triangle], e.vertex_begin, e.vertex_end).ok_or_else(
                    || MeshError::TriangleOutsideSubmesh {
                        mesh: name.clone(),
                        triangle,
                    },
                )?;
                local.push(rebased);
            }

            let mesh = WalkMesh::new(
                to_vectors(&positions[vertices.clone()]),
                to_vectors(&normals[vertices]),
                local,
            )?;
            insert_unique(&mut meshes, name, mesh)?;
        }

        log::info!("Decoded {} walk mesh(es)", meshes.len());
        Ok(Self { meshes })
    }
}

/// All collision meshes of one file, by name
#[derive(Debug, Clone, Default)]
pub struct CollideMeshes {
    meshes: HashMap<String, Arc<ConvexMesh>>,
}

impl CollideMeshes {
    /// Shared handle to the collision mesh called `name`
    pub fn lookup(&self, name: &str) -> Result<Arc<ConvexMesh>, MeshError> {
        self.meshes
            .get(name)
            .cloned()
            .ok_or_else(|| MeshError::NotFound(name.to_string()))
    }

    /// Names of all loaded meshes
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.meshes.keys().map(String::as_str)
    }

    /// Number of loaded meshes
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Whether the file held no meshes
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl Asset for CollideMeshes {
    fn from_bytes(bytes: &[u8]) -> Result<Self, MeshError> {
        let mut reader = ChunkReader::parse(bytes)?;
        let positions: Vec<[f32; 3]> = reader.expect(b"p...")?;
        let names: Vec<u8> = reader.expect(b"str0")?;
        let radii: Option<Vec<f32>> = reader.optional(b"rad0")?;
        let index: Vec<CollideIndexEntry> = reader.expect(b"idxA")?;
        if reader.has_trailing_data() {
            log::warn!("Trailing data in collision mesh file");
        }

        if let Some(radii) = &radii {
            if radii.len() != index.len() {
                return Err(MeshError::RadiusCount {
                    radii: radii.len(),
                    entries: index.len(),
                });
            }
        }

        let mut meshes = HashMap::with_capacity(index.len());
        for (entry, e) in index.iter().enumerate() {
            let name = name_at(&names, entry, e.name_begin, e.name_end)?;
            let vertices = checked_range(e.vertex_begin, e.vertex_end, positions.len())
                .ok_or(MeshError::InvalidVertexRange {
                    entry,
                    begin: e.vertex_begin,
                    end: e.vertex_end,
                })?;

            let vertices = to_vectors(&positions[vertices]);
            let mesh = match &radii {
                Some(radii) => ConvexMesh::with_radius(vertices, radii[entry])?,
                None => ConvexMesh::new(vertices)?,
            };
            insert_unique(&mut meshes, name, Arc::new(mesh))?;
        }

        log::info!("Decoded {} collision mesh(es)", meshes.len());
        Ok(Self { meshes })
    }
}

fn checked_range(begin: u32, end: u32, len: usize) -> Option<Range<usize>> {
    let (begin, end) = (begin as usize, end as usize);
    (begin <= end && end <= len).then_some(begin..end)
}

fn name_at(names: &[u8], entry: usize, begin: u32, end: u32) -> Result<String, MeshError> {
    let range = checked_range(begin, end, names.len())
        .ok_or(MeshError::InvalidNameRange { entry, begin, end })?;
    String::from_utf8(names[range].to_vec()).map_err(|_| MeshError::InvalidName(entry))
}

fn rebase(triangle: &[u32; 3], begin: u32, end: u32) -> Option<[u32; 3]> {
    let inside = triangle.iter().all(|&v| begin <= v && v < end);
    inside.then(|| triangle.map(|v| v - begin))
}

fn to_vectors(raw: &[[f32; 3]]) -> Vec<Vec3> {
    raw.iter().map(|&[x, y, z]| Vec3::new(x, y, z)).collect()
}

fn insert_unique<T>(meshes: &mut HashMap<String, T>, name: String, mesh: T) -> Result<(), MeshError> {
    if meshes.contains_key(&name) {
        return Err(MeshError::DuplicateName(name));
    }
    meshes.insert(name, mesh);
    Ok(())
}
