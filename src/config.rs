use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Base tick rate the pheromone lifespans are expressed against.
pub const TICKS_PER_SECOND: f64 = 10.0;

/// Upper bound for the live speed multiplier exposed by the viewer.
pub const MAX_SPEED: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub width: usize,
    pub height: usize,
    pub ants: usize,
    pub food_piles: usize,
    pub food_per_pile: usize,

    /// Sub-steps per external tick. May change while running.
    pub speed: u32,

    // Pheromone lifespans, in seconds of simulated time
    pub to_nest_lifespan: f64,
    pub to_food_lifespan: f64,

    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            ants: 50,
            food_piles: 5,
            food_per_pile: 100,
            speed: 1,
            to_nest_lifespan: 10.0,
            to_food_lifespan: 6.0,
            seed: 42,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid("grid dimensions must be positive"));
        }
        match self.width.checked_mul(self.height) {
            Some(cells) if cells <= i32::MAX as usize => {}
            _ => return Err(ConfigError::Invalid("grid cell count exceeds i32 range")),
        }
        validate_speed(self.speed)?;
        if !self.to_nest_lifespan.is_finite() || !self.to_food_lifespan.is_finite() {
            return Err(ConfigError::Invalid("pheromone lifespans must be finite"));
        }
        Ok(())
    }

    /// Reads a JSON config; missing fields fall back to their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

pub(crate) fn validate_speed(speed: u32) -> Result<(), ConfigError> {
    if speed == 0 {
        return Err(ConfigError::Invalid("speed multiplier must be at least 1"));
    }
    Ok(())
}
