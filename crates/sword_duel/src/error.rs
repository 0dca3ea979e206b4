//! Game errors

use sword_engine::assets::MeshError;
use sword_engine::config::ConfigError;
use thiserror::Error;

/// Anything that stops the duel from starting
#[derive(Error, Debug)]
pub enum DuelError {
    /// Configuration could not be read
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Arena meshes could not be loaded
    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),

    /// A setting is out of range
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}
