//! Gameplay state handed to collision callbacks

use slotmap::SlotMap;
use sword_engine::foundation::collections::{TransformArena, TransformHandle, TransformSource};
use sword_engine::foundation::math::Transform;
use sword_engine::physics::{Contact, Layer};

use crate::components::{Pawn, PawnId, Stance};
use crate::config::GameplayConfig;

/// Half-angle of a sword swing about the up axis, radians
pub const SWING_ARC: f32 = std::f32::consts::FRAC_PI_3;

/// Combat numbers used while dispatching hits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatRules {
    /// Hit points removed per hit
    pub sword_damage: i32,
    /// Per-attacker immunity after a hit
    pub hit_immunity: f32,
    /// Length of a full swing
    pub swing_time: f32,
    /// Recoil after a parry
    pub recoil_time: f32,
}

impl From<&GameplayConfig> for CombatRules {
    fn from(config: &GameplayConfig) -> Self {
        Self {
            sword_damage: config.sword_damage,
            hit_immunity: config.hit_immunity,
            swing_time: config.swing_time,
            recoil_time: config.recoil_time,
        }
    }
}

impl CombatRules {
    /// Blade angle about the up axis relative to the pawn's heading
    pub fn blade_angle(&self, stance: &Stance) -> f32 {
        match *stance {
            Stance::Idle => -SWING_ARC,
            Stance::Swing { elapsed } => {
                let t = (elapsed / self.swing_time).clamp(0.0, 1.0);
                -SWING_ARC + 2.0 * SWING_ARC * t
            }
            Stance::Recoil { angle, .. } => angle,
        }
    }
}

/// Everything the collision callbacks may touch
pub struct DuelWorld {
    /// Feet and sword transforms of every pawn
    pub transforms: TransformArena,
    /// Live pawns (including those flagged dead but not yet swept)
    pub pawns: SlotMap<PawnId, Pawn>,
    /// Combat numbers
    pub rules: CombatRules,
}

impl TransformSource for DuelWorld {
    fn transform(&self, handle: TransformHandle) -> Option<&Transform> {
        self.transforms.get(handle)
    }
}

impl DuelWorld {
    /// Create an empty world
    pub fn new(rules: CombatRules) -> Self {
        Self {
            transforms: TransformArena::with_key(),
            pawns: SlotMap::with_key(),
            rules,
        }
    }

    /// Sword collider callback of `attacker`.
    ///
    /// A swinging blade that meets another blade recoils. A swinging blade
    /// that meets a body damages it unless the victim is still immune to this
    /// attacker. Victims dropping to zero are only flagged dead.
    pub fn sword_contact(&mut self, attacker: PawnId, contact: &Contact<PawnId>) {
        let rules = self.rules;
        let Some(attacking) = self.pawns.get_mut(attacker) else {
            return;
        };
        if attacking.dead || !attacking.stance.is_swinging() {
            return;
        }

        match contact.other_layer {
            Layer::PlayerSword | Layer::EnemySword => {
                let angle = rules.blade_angle(&attacking.stance);
                attacking.stance = Stance::Recoil {
                    remaining: rules.recoil_time,
                    angle,
                };
                log::debug!("{:?} parried by {:?}", attacker, contact.other_owner);
            }
            Layer::PlayerBody | Layer::EnemyBody => {
                let victim_id = contact.other_owner;
                let Some(victim) = self.pawns.get_mut(victim_id) else {
                    return;
                };
                if victim.dead || victim.is_immune_to(attacker) {
                    return;
                }

                victim.hp -= rules.sword_damage;
                victim.immunity.insert(attacker, rules.hit_immunity);
                log::debug!("{:?} hit {:?}, {} hp left", attacker, victim_id, victim.hp);
                if victim.hp <= 0 {
                    victim.dead = true;
                    log::info!("{:?} ({:?}) falls", victim_id, victim.team);
                }
            }
        }
    }
}
