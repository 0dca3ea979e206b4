//! Game-specific components

use std::collections::HashMap;

use sword_engine::foundation::collections::TransformHandle;
use sword_engine::foundation::math::Vec3;
use sword_engine::physics::{ColliderId, Layer, WalkPoint};

slotmap::new_key_type! {
    /// Generation-checked pawn identity, also the owner of its colliders
    pub struct PawnId;
}

/// Which side a pawn fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    /// The single player-controlled pawn
    Player,
    /// AI opponents
    Enemy,
}

impl Team {
    /// Layer for this team's blades
    pub fn sword_layer(self) -> Layer {
        match self {
            Team::Player => Layer::PlayerSword,
            Team::Enemy => Layer::EnemySword,
        }
    }

    /// Layer for this team's bodies
    pub fn body_layer(self) -> Layer {
        match self {
            Team::Player => Layer::PlayerBody,
            Team::Enemy => Layer::EnemyBody,
        }
    }
}

/// Sword state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stance {
    /// Blade held still at the side
    Idle,
    /// Blade sweeping across the front; `elapsed` seconds in
    Swing {
        /// Time since the swing started
        elapsed: f32,
    },
    /// Swing knocked back by a parry; `remaining` seconds left
    Recoil {
        /// Time until the pawn can swing again
        remaining: f32,
        /// Blade angle when the parry landed
        angle: f32,
    },
}

impl Stance {
    /// Whether the blade currently deals damage
    pub fn is_swinging(&self) -> bool {
        matches!(self, Stance::Swing { .. })
    }
}

/// Per-tick intent written by steering and read by the walk step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PawnControl {
    /// World displacement for this tick
    pub displacement: Vec3,
    /// Facing angle about the up axis, radians from +x
    pub heading: f32,
    /// Start a swing this tick if idle
    pub attack: bool,
}

impl Default for PawnControl {
    fn default() -> Self {
        Self {
            displacement: Vec3::zeros(),
            heading: 0.0,
            attack: false,
        }
    }
}

/// A fighter standing on the walk mesh
#[derive(Debug, Clone)]
pub struct Pawn {
    /// Side
    pub team: Team,
    /// Location on the walk mesh
    pub at: WalkPoint,
    /// Transform at the pawn's feet
    pub feet: TransformHandle,
    /// Transform at the sword hilt
    pub sword: TransformHandle,
    /// Sword collider
    pub sword_collider: ColliderId,
    /// Body collider
    pub body_collider: ColliderId,
    /// Hit points
    pub hp: i32,
    /// Flagged for removal after collision dispatch
    pub dead: bool,
    /// Current intent
    pub control: PawnControl,
    /// Current sword state
    pub stance: Stance,
    /// Remaining immunity against each attacker
    pub immunity: HashMap<PawnId, f32>,
}

impl Pawn {
    /// Whether `attacker` can currently hurt this pawn
    pub fn is_immune_to(&self, attacker: PawnId) -> bool {
        self.immunity.get(&attacker).is_some_and(|&t| t > 0.0)
    }

    /// Count down immunity windows and drop expired ones
    pub fn tick_immunity(&mut self, elapsed: f32) {
        self.immunity.retain(|_, remaining| {
            *remaining -= elapsed;
            *remaining > 0.0
        });
    }
}
