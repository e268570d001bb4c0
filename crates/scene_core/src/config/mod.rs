//! Configuration system
//!
//! File-backed configuration for the scene core. Files are TOML or RON,
//! chosen by extension.

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
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

/// Scene configuration
///
/// Tunables for the entity manager: capacity, reclamation cadence and the
/// fixed-step clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Maximum number of live entities (including zombies awaiting the sweep)
    pub max_entities: usize,

    /// Run the reclamation sweep every N fixed updates
    pub sweep_interval: u32,

    /// Fixed update step in seconds
    pub fixed_timestep: f64,

    /// Upper bound on fixed steps run for a single frame
    pub max_fixed_steps_per_tick: u32,

    /// Angular tolerance (radians) below which a locked axis is left alone
    pub axis_lock_epsilon: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_entities: 10000,
            sweep_interval: 1,
            fixed_timestep: 1.0 / 60.0,
            max_fixed_steps_per_tick: 8,
            axis_lock_epsilon: 1e-9,
        }
    }
}

impl Config for SceneConfig {}

impl SceneConfig {
    /// Check that every field is usable, describing the first problem found
    pub fn validate(&self) -> Result<(), String> {
        if self.max_entities == 0 {
            return Err("max_entities must be greater than zero".to_string());
        }
        if self.sweep_interval == 0 {
            return Err("sweep_interval must be at least 1".to_string());
        }
        if !self.fixed_timestep.is_finite() || self.fixed_timestep <= 0.0 {
            return Err(format!("fixed_timestep must be positive, got {}", self.fixed_timestep));
        }
        if self.max_fixed_steps_per_tick == 0 {
            return Err("max_fixed_steps_per_tick must be at least 1".to_string());
        }
        if !self.axis_lock_epsilon.is_finite() || self.axis_lock_epsilon < 0.0 {
            return Err(format!(
                "axis_lock_epsilon must be non-negative, got {}",
                self.axis_lock_epsilon
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        let config = SceneConfig {
            sweep_interval: 0,
            ..SceneConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: SceneConfig = toml::from_str("max_entities = 32").unwrap();
        assert_eq!(config.max_entities, 32);
        assert_eq!(config.sweep_interval, SceneConfig::default().sweep_interval);
    }

    #[test]
    fn test_ron_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("scene_config_{}.ron", std::process::id()));
        let path = path.to_str().unwrap().to_string();

        let config = SceneConfig {
            max_entities: 64,
            sweep_interval: 4,
            ..SceneConfig::default()
        };
        config.save_to_file(&path).unwrap();
        let loaded = SceneConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let result = SceneConfig::load_from_file("scene.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_)) | Err(ConfigError::UnsupportedFormat(_))));
    }
}
