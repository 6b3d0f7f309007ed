// src/config.rs
//! User settings for mass planting, read from a RON file at startup.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest accepted grid side. 25² plants in one click is already a field.
pub const MAX_GRID_SIZE: u32 = 25;

#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MassFarmingConfig {
    /// Cells per side of the planting grid (odd, the batch is `n * n` plants).
    pub plant_grid_size: u32,
    /// Plant without paying or checking stamina.
    pub ignore_stamina: bool,
    /// Plant without checking materials. Whatever the player holds is still spent.
    pub ignore_placement_cost: bool,
    /// Keyboard key that enables mass placement while held.
    pub mass_action_hotkey: KeyCode,
    /// Controller button that does the same.
    pub controller_hotkey: GamepadButton,
}

impl Default for MassFarmingConfig {
    fn default() -> Self {
        Self {
            plant_grid_size: 5,
            ignore_stamina: false,
            ignore_placement_cost: false,
            mass_action_hotkey: KeyCode::ShiftLeft,
            controller_hotkey: GamepadButton::West,
        }
    }
}

impl MassFarmingConfig {
    /// Number of cells in one batch, the preview pool size.
    #[inline]
    pub fn cells_per_batch(&self) -> usize {
        (self.plant_grid_size as usize) * (self.plant_grid_size as usize)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.plant_grid_size;
        if n == 0 || n > MAX_GRID_SIZE || n % 2 == 0 {
            return Err(ConfigError::GridSize { size: self.plant_grid_size });
        }
        Ok(())
    }

    pub fn from_ron_str(src: &str) -> Result<Self, ConfigError> {
        let cfg: Self = ron::from_str(src).map_err(|e| ConfigError::Ron(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path.as_ref())?;
        let cfg = Self::from_ron_str(&src)?;
        info!(
            "MassFarming: loaded '{}' (grid {}x{}, ignore_stamina={}, ignore_cost={})",
            path.as_ref().display(),
            cfg.plant_grid_size,
            cfg.plant_grid_size,
            cfg.ignore_stamina,
            cfg.ignore_placement_cost
        );
        Ok(cfg)
    }

    /// `load`, falling back to defaults with a warning.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("MassFarming: using default config ({})", e);
                Self::default()
            }
        }
    }
}

// ---------- Config errors ----------

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("I/O while reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(String),
    #[error("plant_grid_size must be an odd number within 1..={max}, got {size}", max = MAX_GRID_SIZE)]
    GridSize { size: u32 },
}
