//! Fixed-step duel simulation
//!
//! One tick: steer every pawn, advance sword stances, walk along the arena
//! surface, re-derive upright orientation, place swords, run one collision
//! update (whose callbacks apply damage), then sweep pawns flagged dead.

use std::collections::HashMap;
use std::sync::Arc;

use sword_engine::foundation::math::{Quat, Transform, Vec3};
use sword_engine::physics::{
    advance, upright_rotation, ColliderDesc, CollisionEngine, Contact, ConvexMesh, HitCallback,
    WalkMesh, WalkSettings,
};

use crate::assets::{ArenaAssets, SHOULDER_HEIGHT};
use crate::components::{Pawn, PawnControl, PawnId, Stance, Team};
use crate::config::{DuelConfig, GameplayConfig};
use crate::error::DuelError;
use crate::world::{CombatRules, DuelWorld};

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Intersecting collider pairs
    pub hits: usize,
    /// Pawns removed by the sweep
    pub fallen: Vec<PawnId>,
}

/// Result of a whole run
#[derive(Debug, Clone, PartialEq)]
pub struct DuelSummary {
    /// Ticks simulated
    pub ticks: u32,
    /// Winning side, if the fight ended
    pub winner: Option<Team>,
    /// Player hit points at the end, if alive
    pub player_hp: Option<i32>,
    /// Enemies still standing
    pub enemies_left: usize,
}

/// The running duel
pub struct Duel {
    world: DuelWorld,
    engine: CollisionEngine<DuelWorld, PawnId>,
    walk_mesh: WalkMesh,
    sword_mesh: Arc<ConvexMesh>,
    body_mesh: Arc<ConvexMesh>,
    gameplay: GameplayConfig,
    walk: WalkSettings,
    player: PawnId,
    ticks: u32,
}

impl Duel {
    /// Set up the arena with the player and the configured enemies
    pub fn new(config: &DuelConfig, assets: ArenaAssets) -> Result<Self, DuelError> {
        let gameplay = config.gameplay.clone();
        if gameplay.tick_rate <= 0.0 {
            return Err(DuelError::InvalidSetting(format!("tick_rate {}", gameplay.tick_rate)));
        }
        if gameplay.swing_time <= 0.0 {
            return Err(DuelError::InvalidSetting(format!("swing_time {}", gameplay.swing_time)));
        }

        let mut duel = Self {
            world: DuelWorld::new(CombatRules::from(&gameplay)),
            engine: CollisionEngine::new(&config.physics.collision),
            walk_mesh: assets.walk_mesh,
            sword_mesh: assets.sword,
            body_mesh: assets.body,
            walk: config.physics.walk,
            player: PawnId::default(),
            ticks: 0,
            gameplay,
        };

        duel.player = duel.spawn(Team::Player, Vec3::new(duel.gameplay.orbit_radius, 0.0, 0.0));
        for i in 0..duel.gameplay.enemy_count {
            let angle = std::f32::consts::TAU * (i as f32 + 0.5) / duel.gameplay.enemy_count as f32;
            let radius = duel.gameplay.spawn_radius;
            duel.spawn(Team::Enemy, Vec3::new(radius * angle.cos(), radius * angle.sin(), 0.0));
        }
        log::info!(
            "Duel ready: {} enemies, {} colliders",
            duel.gameplay.enemy_count,
            duel.engine.len()
        );
        Ok(duel)
    }

    /// Add a pawn at the walk mesh point nearest `position`
    pub fn spawn(&mut self, team: Team, position: Vec3) -> PawnId {
        let at = self.walk_mesh.nearest_walk_point(&position);
        let DuelWorld {
            transforms, pawns, ..
        } = &mut self.world;
        let feet = transforms.insert(Transform::from_position(self.walk_mesh.to_world_point(&at)));
        let sword = transforms.insert(Transform::from_position(Vec3::new(0.0, 0.0, SHOULDER_HEIGHT)));

        let engine = &mut self.engine;
        let (sword_mesh, body_mesh) = (&self.sword_mesh, &self.body_mesh);
        let max_hp = self.gameplay.max_hp;

        let id = pawns.insert_with_key(|id| {
            let on_hit: HitCallback<DuelWorld, PawnId> =
                Box::new(
                    move |_: &mut CollisionEngine<DuelWorld, PawnId>,
                          world: &mut DuelWorld,
                          contact: &Contact<PawnId>| {
                        world.sword_contact(id, contact);
                    },
                );
            let sword_collider = engine.register(
                ColliderDesc {
                    owner: id,
                    transform: sword,
                    mesh: Arc::clone(sword_mesh),
                    cull_radius: sword_mesh.containing_radius(),
                    layer: team.sword_layer(),
                },
                Some(on_hit),
            );
            let body_collider = engine.register(
                ColliderDesc {
                    owner: id,
                    transform: feet,
                    mesh: Arc::clone(body_mesh),
                    cull_radius: body_mesh.containing_radius(),
                    layer: team.body_layer(),
                },
                None,
            );

            Pawn {
                team,
                at,
                feet,
                sword,
                sword_collider,
                body_collider,
                hp: max_hp,
                dead: false,
                control: PawnControl::default(),
                stance: Stance::Idle,
                immunity: HashMap::new(),
            }
        });
        log::debug!("Spawned {:?} as {:?}", team, id);
        id
    }

    /// Advance the simulation by `elapsed` seconds
    pub fn tick(&mut self, elapsed: f32) -> TickReport {
        self.steer(elapsed);
        self.advance_stances(elapsed);
        self.walk_pawns();
        self.place_swords();
        let hits = self.engine.update(&mut self.world, elapsed);
        let fallen = self.sweep_dead();
        self.ticks += 1;
        TickReport { hits, fallen }
    }

    /// Run until one side is wiped out or the tick budget is spent
    pub fn run(&mut self) -> DuelSummary {
        let elapsed = self.gameplay.tick_length();
        while self.ticks < self.gameplay.tick_count && self.winner().is_none() {
            self.tick(elapsed);
        }
        self.summary()
    }

    /// Winning side once the other has no pawns left
    pub fn winner(&self) -> Option<Team> {
        if !self.world.pawns.contains_key(self.player) {
            Some(Team::Enemy)
        } else if self.enemies_left() == 0 {
            Some(Team::Player)
        } else {
            None
        }
    }

    /// Snapshot of the current result
    pub fn summary(&self) -> DuelSummary {
        DuelSummary {
            ticks: self.ticks,
            winner: self.winner(),
            player_hp: self.world.pawns.get(self.player).map(|pawn| pawn.hp),
            enemies_left: self.enemies_left(),
        }
    }

    /// Pawns still on the enemy team
    pub fn enemies_left(&self) -> usize {
        self.world
            .pawns
            .values()
            .filter(|pawn| pawn.team == Team::Enemy)
            .count()
    }

    /// The player's id (stops resolving once the player is swept)
    pub fn player(&self) -> PawnId {
        self.player
    }

    /// Gameplay state
    pub fn world(&self) -> &DuelWorld {
        &self.world
    }

    /// Mutable gameplay state
    pub fn world_mut(&mut self) -> &mut DuelWorld {
        &mut self.world
    }

    /// Collision engine
    pub fn engine(&self) -> &CollisionEngine<DuelWorld, PawnId> {
        &self.engine
    }

    /// Arena surface
    pub fn walk_mesh(&self) -> &WalkMesh {
        &self.walk_mesh
    }

    fn feet_position(&self, id: PawnId) -> Option<Vec3> {
        let pawn = self.world.pawns.get(id)?;
        self.world.transforms.get(pawn.feet).map(|t| t.position)
    }

    /// Player circles the centre and faces the nearest enemy in reach;
    /// enemies close in on the player.
    fn steer(&mut self, elapsed: f32) {
        let config = &self.gameplay;
        let player_position = self.feet_position(self.player);

        let positions: Vec<(PawnId, Team, Vec3)> = self
            .world
            .pawns
            .iter()
            .filter_map(|(id, pawn)| {
                let transform = self.world.transforms.get(pawn.feet)?;
                Some((id, pawn.team, transform.position))
            })
            .collect();

        let mut controls = Vec::with_capacity(positions.len());
        for &(id, team, position) in &positions {
            let control = match team {
                Team::Player => {
                    let nearest = positions
                        .iter()
                        .filter(|(_, other, _)| *other == Team::Enemy)
                        .map(|(_, _, p)| flat(p - position))
                        .min_by(|a, b| a.norm_squared().total_cmp(&b.norm_squared()));
                    orbit(position, nearest, config, elapsed)
                }
                Team::Enemy => match player_position {
                    Some(target) => chase(position, target, config, elapsed),
                    None => PawnControl::default(),
                },
            };
            controls.push((id, control));
        }

        for (id, control) in controls {
            if let Some(pawn) = self.world.pawns.get_mut(id) {
                pawn.control = control;
            }
        }
    }

    fn advance_stances(&mut self, elapsed: f32) {
        let rules = self.world.rules;
        for pawn in self.world.pawns.values_mut() {
            pawn.tick_immunity(elapsed);
            pawn.stance = match pawn.stance {
                Stance::Swing { elapsed: t } if t + elapsed >= rules.swing_time => Stance::Idle,
                Stance::Swing { elapsed: t } => Stance::Swing { elapsed: t + elapsed },
                Stance::Recoil { remaining, .. } if remaining <= elapsed => Stance::Idle,
                Stance::Recoil { remaining, angle } => Stance::Recoil {
                    remaining: remaining - elapsed,
                    angle,
                },
                Stance::Idle if pawn.control.attack => Stance::Swing { elapsed: 0.0 },
                Stance::Idle => Stance::Idle,
            };
        }
    }

    fn walk_pawns(&mut self) {
        let DuelWorld {
            transforms, pawns, ..
        } = &mut self.world;
        for (id, pawn) in pawns.iter_mut() {
            let outcome = advance(&self.walk_mesh, &pawn.at, &pawn.control.displacement, &self.walk);
            if !outcome.is_complete() {
                log::warn!(
                    "{:?} used the full walk budget, {:?} left over",
                    id,
                    outcome.residual
                );
            }
            pawn.at = outcome.end;

            let Some(feet) = transforms.get_mut(pawn.feet) else {
                continue;
            };
            let facing = Quat::from_axis_angle(&Vec3::z_axis(), pawn.control.heading);
            feet.position = self.walk_mesh.to_world_point(&pawn.at);
            feet.rotation = upright_rotation(&facing, &Vec3::z(), &self.walk_mesh.smooth_normal(&pawn.at));
        }
    }

    fn place_swords(&mut self) {
        let rules = self.world.rules;
        let DuelWorld {
            transforms, pawns, ..
        } = &mut self.world;
        for pawn in pawns.values() {
            let Some(feet) = transforms.get(pawn.feet).cloned() else {
                continue;
            };
            let swing = Quat::from_axis_angle(&Vec3::z_axis(), rules.blade_angle(&pawn.stance));
            if let Some(sword) = transforms.get_mut(pawn.sword) {
                sword.position = feet.position + feet.rotation * Vec3::new(0.0, 0.0, SHOULDER_HEIGHT);
                sword.rotation = feet.rotation * swing;
            }
        }
    }

    /// Remove every pawn flagged dead, with its colliders and transforms
    fn sweep_dead(&mut self) -> Vec<PawnId> {
        let fallen: Vec<PawnId> = self
            .world
            .pawns
            .iter()
            .filter(|(_, pawn)| pawn.dead)
            .map(|(id, _)| id)
            .collect();

        for &id in &fallen {
            if let Some(pawn) = self.world.pawns.remove(id) {
                self.engine.unregister(pawn.sword_collider);
                self.engine.unregister(pawn.body_collider);
                self.world.transforms.remove(pawn.feet);
                self.world.transforms.remove(pawn.sword);
                log::info!("Swept {:?} ({:?})", id, pawn.team);
            }
        }
        fallen
    }
}

/// Drop the vertical component
fn flat(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, 0.0)
}

fn heading_of(direction: &Vec3) -> f32 {
    direction.y.atan2(direction.x)
}

fn orbit(position: Vec3, nearest_enemy: Option<Vec3>, config: &GameplayConfig, elapsed: f32) -> PawnControl {
    let radial = flat(position);
    let distance = radial.norm();
    let direction = if distance > 1.0e-4 {
        let outward = radial / distance;
        let tangent = Vec3::new(-outward.y, outward.x, 0.0);
        (tangent + outward * (config.orbit_radius - distance)).normalize()
    } else {
        Vec3::x()
    };

    let in_reach = nearest_enemy.filter(|offset| offset.norm() < config.attack_range);
    PawnControl {
        displacement: direction * config.player_speed * elapsed,
        heading: heading_of(in_reach.as_ref().unwrap_or(&direction)),
        attack: in_reach.is_some(),
    }
}

fn chase(position: Vec3, target: Vec3, config: &GameplayConfig, elapsed: f32) -> PawnControl {
    let offset = flat(target - position);
    let distance = offset.norm();
    if distance <= 1.0e-4 {
        return PawnControl::default();
    }

    let direction = offset / distance;
    let step = (config.enemy_speed * elapsed).min((distance - config.engage_distance).max(0.0));
    PawnControl {
        displacement: direction * step,
        heading: heading_of(&direction),
        attack: distance < config.attack_range,
    }
}
