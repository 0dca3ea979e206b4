//! Collision geometry
//!
//! # Architecture
//!
//! - **Model Space Storage**: Collision meshes stored in local coordinates
//! - **On-Demand Transformation**: Support points mapped to world space only
//!   during narrow-phase tests
//! - **Coordinate Decoupling**: Mesh geometry separate from the transform arena
//!
//! # Module Organization
//!
//! - [`primitives`] - Bounding spheres and triangles
//! - [`mesh`] - Convex collision meshes

pub mod mesh;
pub mod primitives;

pub use mesh::ConvexMesh;
pub use primitives::{BoundingSphere, Triangle};
