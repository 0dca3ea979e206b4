//! Configuration system
//!
//! Settings structs are plain serde types. Any of them can be read from or
//! written to a TOML or RON file through the [`Config`] trait; the format is
//! picked from the file extension.

use std::path::Path;

pub use serde::{Deserialize, Serialize};

use crate::physics::collision_system::CollisionSettings;
use crate::physics::walk::WalkSettings;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match Format::of(path)? {
            Format::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Format::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match Format::of(path)? {
            Format::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents)?;
        Ok(())
    }
}

enum Format {
    Toml,
    Ron,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Tuning for the walk solver and the collision engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Walk solver settings
    pub walk: WalkSettings,
    /// Collision engine settings
    pub collision: CollisionSettings,
}

impl Config for PhysicsConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision_layers::Layer;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: PhysicsConfig = toml::from_str(
            r#"
            [walk]
            max_iterations = 4

            [collision]
            interacting_layers = [["PlayerSword", "EnemyBody"]]
            "#,
        )
        .unwrap();

        assert_eq!(config.walk.max_iterations, 4);
        assert_eq!(config.walk.wall_bounce, 1.25);
        assert_eq!(config.collision.gjk_max_iterations, 64);

        let matrix = config.collision.layer_matrix();
        assert!(matrix.interacts(Layer::EnemyBody, Layer::PlayerSword));
        assert!(!matrix.interacts(Layer::PlayerSword, Layer::EnemySword));
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = PhysicsConfig::default();
        config.walk.wall_nudge = 0.05;
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let back: PhysicsConfig = ron::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_file_round_trip_and_unknown_extension() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("sword_physics_{}.toml", std::process::id()));

        let mut config = PhysicsConfig::default();
        config.collision.gjk_max_iterations = 32;
        config.save_to_file(&path).unwrap();
        let loaded = PhysicsConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);

        assert!(matches!(
            config.save_to_file(dir.join("physics.yaml")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
