//! Space Configuration
//!
//! Values are raw Q16.16, so a JSON config spells a 64-unit cell as
//! `4194304`. Every field has a default and may be omitted.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, FIXED_ONE};
use super::grid::DrawMode;

/// Default cell edge: 64 units.
pub const DEFAULT_CELL_SIZE: Fixed = 64 * FIXED_ONE;

/// Tunable parameters of a space.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    /// Cell width (fixed-point, > 0)
    pub cell_width: Fixed,
    /// Cell height (fixed-point, > 0)
    pub cell_height: Fixed,
    /// Locator ordering within cells
    pub draw_mode: DrawMode,
    /// Global multiplier on every mobile's per-frame displacement (>= 0)
    pub time_factor: Fixed,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            cell_width: DEFAULT_CELL_SIZE,
            cell_height: DEFAULT_CELL_SIZE,
            draw_mode: DrawMode::Flat,
            time_factor: FIXED_ONE,
        }
    }
}

impl SpaceConfig {
    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_width <= 0 {
            return Err(ConfigError::InvalidCellWidth(self.cell_width));
        }
        if self.cell_height <= 0 {
            return Err(ConfigError::InvalidCellHeight(self.cell_height));
        }
        if self.time_factor < 0 {
            return Err(ConfigError::InvalidTimeFactor(self.time_factor));
        }
        Ok(())
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SpaceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Cell width must be positive.
    #[error("cell width must be positive, got {0}")]
    InvalidCellWidth(Fixed),

    /// Cell height must be positive.
    #[error("cell height must be positive, got {0}")]
    InvalidCellHeight(Fixed),

    /// Time factor must not be negative.
    #[error("time factor must not be negative, got {0}")]
    InvalidTimeFactor(Fixed),

    /// Malformed JSON.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SpaceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SpaceConfig::from_json_str(r#"{"cell_width": 6553600, "draw_mode": "YOver"}"#).unwrap();
        assert_eq!(config.cell_width, 100 * FIXED_ONE);
        assert_eq!(config.cell_height, DEFAULT_CELL_SIZE);
        assert_eq!(config.draw_mode, DrawMode::YOver);
        assert_eq!(config.time_factor, FIXED_ONE);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            SpaceConfig::from_json_str(r#"{"cell_height": 0}"#),
            Err(ConfigError::InvalidCellHeight(0))
        ));
        assert!(matches!(
            SpaceConfig::from_json_str(r#"{"time_factor": -1}"#),
            Err(ConfigError::InvalidTimeFactor(-1))
        ));
        assert!(matches!(SpaceConfig::from_json_str("{"), Err(ConfigError::Parse(_))));
    }
}
