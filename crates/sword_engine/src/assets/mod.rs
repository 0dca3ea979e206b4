//! Asset management system
//!
//! Mesh libraries exported by the level pipeline, decoded from the chunked
//! binary container in [`chunk`].

pub mod chunk;
pub mod mesh_library;

pub use chunk::{write_chunk, ChunkReader};
pub use mesh_library::{CollideMeshes, WalkMeshes};

use std::path::Path;

use thiserror::Error;

/// Asset trait for loadable resources
pub trait Asset: Sized {
    /// Load asset from raw bytes
    fn from_bytes(bytes: &[u8]) -> Result<Self, MeshError>;

    /// Read a whole file and decode it
    fn load_file(path: impl AsRef<Path>) -> Result<Self, MeshError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let asset = Self::from_bytes(&bytes)?;
        log::info!("Loaded {} ({} bytes)", path.display(), bytes.len());
        Ok(asset)
    }
}

/// Mesh loading and lookup errors
#[derive(Error, Debug)]
pub enum MeshError {
    /// IO error during asset loading
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A chunk declares more payload than the file holds
    #[error("Chunk '{magic}' declares {declared} bytes but only {available} remain")]
    TruncatedChunk {
        /// Magic of the offending chunk
        magic: String,
        /// Declared payload length
        declared: usize,
        /// Bytes left in the file
        available: usize,
    },

    /// Chunks are out of order or missing
    #[error("Expected chunk '{expected}', found '{found}'")]
    UnexpectedChunk {
        /// Magic that was required
        expected: String,
        /// Magic that was present
        found: String,
    },

    /// Payload length is not a whole number of elements
    #[error("Chunk '{magic}' has {size} bytes, not a multiple of {element}")]
    ChunkSize {
        /// Magic of the offending chunk
        magic: String,
        /// Payload length in bytes
        size: usize,
        /// Element size in bytes
        element: usize,
    },

    /// Position and normal arrays differ in length
    #[error("Mismatched position ({positions}) and normal ({normals}) counts")]
    MismatchedNormals {
        /// Number of positions
        positions: usize,
        /// Number of normals
        normals: usize,
    },

    /// Index entry name range is out of bounds
    #[error("Invalid name range {begin}..{end} in index entry {entry}")]
    InvalidNameRange {
        /// Index entry number
        entry: usize,
        /// Range start
        begin: u32,
        /// Range end
        end: u32,
    },

    /// Index entry vertex range is out of bounds
    #[error("Invalid vertex range {begin}..{end} in index entry {entry}")]
    InvalidVertexRange {
        /// Index entry number
        entry: usize,
        /// Range start
        begin: u32,
        /// Range end
        end: u32,
    },

    /// Index entry triangle range is out of bounds
    #[error("Invalid triangle range {begin}..{end} in index entry {entry}")]
    InvalidTriangleRange {
        /// Index entry number
        entry: usize,
        /// Range start
        begin: u32,
        /// Range end
        end: u32,
    },

    /// A triangle references a vertex outside its own sub-mesh
    #[error("Triangle {triangle} references vertices outside mesh '{mesh}'")]
    TriangleOutsideSubmesh {
        /// Sub-mesh name
        mesh: String,
        /// Triangle index in the file
        triangle: usize,
    },

    /// Sub-mesh name is not UTF-8
    #[error("Mesh name in index entry {0} is not valid UTF-8")]
    InvalidName(usize),

    /// Two sub-meshes share a name
    #[error("Duplicate mesh name '{0}'")]
    DuplicateName(String),

    /// Lookup of a name that was never loaded
    #[error("Mesh '{0}' not found")]
    NotFound(String),

    /// A directed edge is used by more than one triangle
    #[error("Edge ({0}, {1}) is used by more than one triangle")]
    DuplicateEdge(u32, u32),

    /// A triangle references a vertex that does not exist
    #[error("Triangle {triangle} references vertex {vertex} of {count}")]
    VertexOutOfRange {
        /// Triangle index
        triangle: usize,
        /// Offending vertex index
        vertex: u32,
        /// Number of vertices
        count: usize,
    },

    /// A mesh with no vertices or no triangles
    #[error("Mesh has no geometry")]
    EmptyMesh,

    /// A containing radius that is negative or NaN
    #[error("Invalid containing radius {0}")]
    InvalidRadius(f32),

    /// Radius chunk length differs from the index length
    #[error("{radii} radii for {entries} index entries")]
    RadiusCount {
        /// Number of radii
        radii: usize,
        /// Number of index entries
        entries: usize,
    },
}
