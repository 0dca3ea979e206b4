//! # Sword Engine
//!
//! Collision and locomotion core for a sword-fighting prototype.
//!
//! ## Features
//!
//! - **GJK Narrow Phase**: convex mesh intersection under independent transforms
//! - **Layered Collision Engine**: once-per-tick pair testing with deferred dispatch
//! - **Walk Meshes**: movement constrained to a triangulated surface
//! - **Mesh Libraries**: chunked binary assets with load-time validation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sword_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let walk_meshes = WalkMeshes::load_file("arena.w")?;
//!     let mesh = walk_meshes.lookup("Arena")?;
//!
//!     let start = mesh.nearest_walk_point(&Vec3::new(0.0, 0.0, 0.0));
//!     let outcome = advance(mesh, &start, &Vec3::new(0.5, 0.0, 0.0), &WalkSettings::default());
//!     println!("now at {}", mesh.to_world_point(&outcome.end));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod foundation;
pub mod physics;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{Asset, CollideMeshes, MeshError, WalkMeshes},
        config::{Config, ConfigError, PhysicsConfig},
        foundation::{
            collections::{TransformArena, TransformHandle, TransformSource},
            math::{Quat, Transform, Vec3},
        },
        physics::{
            advance, upright_rotation, ColliderDesc, ColliderId, CollisionEngine,
            CollisionSettings, Contact, ConvexMesh, HitCallback, Layer, LayerMatrix, WalkMesh,
            WalkOutcome, WalkPoint, WalkSettings,
        },
    };
}
