// Data-driven drill configuration.
//
// Tunable session parameters live in `DrillConfig`, loaded from JSON. Every
// field has a default, so a config file only needs the values it overrides
// and an empty object `{}` is a valid config.
//
// See also: `session.rs`, which reads the timer and history settings, and
// `countdown.rs`, which reads the tick interval.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_TIMER_DURATION: u32 = 60;
pub const DEFAULT_HISTORY_CAPACITY: usize = 4;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrillConfig {
    /// Seed for target rotation. `None` seeds from the wall clock.
    pub seed: Option<u32>,
    /// Timed-mode length in ticks.
    pub timer_duration: u32,
    /// How many recent targets are kept out of rotation.
    pub history_capacity: usize,
    /// Real-time length of one tick.
    pub tick_interval_ms: u64,
    /// Highest fret drilled on fretted instruments.
    pub max_fret: u8,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            seed: None,
            timer_duration: DEFAULT_TIMER_DURATION,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            max_fret: notedrill_theory::fretboard::DEFAULT_MAX_FRET,
        }
    }
}

impl DrillConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
