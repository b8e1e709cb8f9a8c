//! Viewer configuration loaded from TOML

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Settings for the terminal viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Target frames per second
    pub fps: u32,
    /// Idle rotation in radians per second, 0 to disable
    pub spin_speed: f32,
    /// Rotation applied per key press, radians
    pub rotate_step: f32,
    pub show_faces: bool,
    pub show_edges: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            spin_speed: 0.3,
            rotate_step: 0.1,
            show_faces: true,
            show_edges: true,
        }
    }
}

impl ViewerConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 || self.fps > 240 {
            return Err(ConfigError::Invalid(format!("fps must be in 1..=240, got {}", self.fps)));
        }
        if !self.show_faces && !self.show_edges {
            return Err(ConfigError::Invalid("nothing to draw: faces and edges both hidden".into()));
        }
        Ok(())
    }
}
