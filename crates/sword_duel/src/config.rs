//! Game configuration

use serde::{Deserialize, Serialize};
use sword_engine::config::{Config, PhysicsConfig};

/// Game configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    /// Where the arena geometry comes from
    pub arena: ArenaConfig,

    /// Gameplay settings
    pub gameplay: GameplayConfig,

    /// Walk solver and collision tuning
    pub physics: PhysicsConfig,
}

impl Config for DuelConfig {}

/// Mesh sources and names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Walk mesh library file; the built-in arena is used when absent
    pub walk_meshes: Option<String>,

    /// Collision mesh library file; the built-in meshes are used when absent
    pub collide_meshes: Option<String>,

    /// Walk mesh to fight on
    pub walk_mesh: String,

    /// Collision mesh for swords
    pub sword_mesh: String,

    /// Collision mesh for bodies
    pub body_mesh: String,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            walk_meshes: None,
            collide_meshes: None,
            walk_mesh: "Arena".to_string(),
            sword_mesh: "Sword".to_string(),
            body_mesh: "Body".to_string(),
        }
    }
}

/// Gameplay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Ticks to simulate before giving up on a winner
    pub tick_count: u32,

    /// Ticks per second
    pub tick_rate: f32,

    /// Number of enemies
    pub enemy_count: u32,

    /// Distance from the arena centre at which enemies spawn
    pub spawn_radius: f32,

    /// Radius of the player's circling path
    pub orbit_radius: f32,

    /// Player walking speed (units per second)
    pub player_speed: f32,

    /// Enemy walking speed (units per second)
    pub enemy_speed: f32,

    /// Enemies stop advancing this close to the player
    pub engage_distance: f32,

    /// A pawn starts a swing when an opponent is this close
    pub attack_range: f32,

    /// Starting hit points
    pub max_hp: i32,

    /// Hit points removed by one sword hit
    pub sword_damage: i32,

    /// Seconds a victim ignores further hits from the same attacker
    pub hit_immunity: f32,

    /// Seconds for a full swing
    pub swing_time: f32,

    /// Seconds a parried swing spends recoiling
    pub recoil_time: f32,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            tick_count: 1200,
            tick_rate: 60.0,
            enemy_count: 3,
            spawn_radius: 6.0,
            orbit_radius: 3.0,
            player_speed: 1.5,
            enemy_speed: 2.0,
            engage_distance: 1.0,
            attack_range: 1.5,
            max_hp: 100,
            sword_damage: 20,
            hit_immunity: 0.5,
            swing_time: 0.6,
            recoil_time: 0.3,
        }
    }
}

impl GameplayConfig {
    /// Seconds per tick
    pub fn tick_length(&self) -> f32 {
        1.0 / self.tick_rate
    }
}
