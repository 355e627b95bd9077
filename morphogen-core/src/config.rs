//! Engine configuration.
//!
//! Every field has a default and unknown fields are ignored, so older and
//! newer config files keep loading.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Settings for the engine and its tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Period of the iteration timer, in milliseconds.
    pub tick_interval_ms: u64,

    /// Turn an edge of every predge-less cycle into a predge after each edit.
    pub auto_repair_predges: bool,

    /// Equalize the destination's blend factors after each connect.
    pub equalize_on_connect: bool,

    /// Blend factor used when `connect` is given none.
    pub default_blend_factor: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 40,
            auto_repair_predges: true,
            equalize_on_connect: false,
            default_blend_factor: 1.0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(GraphError::Config)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(GraphError::InvalidConfig("tick_interval_ms must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.default_blend_factor) {
            return Err(GraphError::InvalidConfig(format!(
                "default_blend_factor {} is outside [0, 1]",
                self.default_blend_factor
            )));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
