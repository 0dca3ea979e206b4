//! Physics module for collision detection and walking
//!
//! - [`gjk`]: boolean convex-convex intersection under rigid transforms
//! - [`collision_system`]: layered collider registry with two-phase
//!   detect-then-dispatch updates
//! - [`walk_mesh`] and [`walk`]: surface-constrained movement

pub mod barycentric;
pub mod collision;
pub mod collision_layers;
pub mod collision_system;
pub mod gjk;
pub mod walk;
pub mod walk_mesh;

#[cfg(test)]
mod tests;

pub use collision::{BoundingSphere, ConvexMesh, Triangle};
pub use collision_layers::{Layer, LayerMask, LayerMatrix};
pub use collision_system::{
    ColliderDesc, ColliderId, CollisionEngine, CollisionSettings, Contact, HitCallback,
};
pub use walk::{advance, upright_rotation, WalkOutcome, WalkSettings};
pub use walk_mesh::{TriangleStep, WalkMesh, WalkPoint};
