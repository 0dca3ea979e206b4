//! Sword duel
//!
//! Headless arena fight: the player circles the raised centre while enemies
//! close in, everyone walking on the arena's walk mesh and trading blows
//! through the layered collision engine.
//!
//! Usage: `sword_duel [config.toml|config.ron]`

mod assets;
mod components;
mod config;
mod error;
mod simulation;
mod world;

use std::path::Path;

use sword_engine::config::Config;

use crate::assets::ArenaAssets;
use crate::config::DuelConfig;
use crate::error::DuelError;
use crate::simulation::Duel;

const DEFAULT_CONFIG: &str = "sword_duel.toml";

fn main() -> Result<(), DuelError> {
    sword_engine::foundation::logging::init();

    let config = load_config()?;
    let assets = ArenaAssets::load(&config.arena)?;
    let mut duel = Duel::new(&config, assets)?;

    let summary = duel.run();
    match summary.winner {
        Some(team) => log::info!("{:?} wins after {} ticks", team, summary.ticks),
        None => log::info!("No winner after {} ticks", summary.ticks),
    }
    log::info!(
        "Player hp: {}, enemies left: {}",
        summary
            .player_hp
            .map_or_else(|| "fallen".to_string(), |hp| hp.to_string()),
        summary.enemies_left
    );
    Ok(())
}

/// Config from the first argument, the default file if present, or defaults
fn load_config() -> Result<DuelConfig, DuelError> {
    if let Some(path) = std::env::args().nth(1) {
        log::info!("Loading configuration from {}", path);
        return Ok(DuelConfig::load_from_file(path)?);
    }
    if Path::new(DEFAULT_CONFIG).exists() {
        log::info!("Loading configuration from {}", DEFAULT_CONFIG);
        return Ok(DuelConfig::load_from_file(DEFAULT_CONFIG)?);
    }
    log::info!("Using default configuration");
    Ok(DuelConfig::default())
}
