//! Simulation configuration.
//!
//! The slice lengths default to the classic 6/4 split and the clock starts
//! at tick 0. A TOML file can override any of them:
//!
//! ```toml
//! high_slice = 6
//! medium_slice = 4
//! start_time = 0
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::Tick;

/// Ticks the dispatcher favors High before handing over to Medium.
pub const DEFAULT_HIGH_SLICE: u32 = 6;
/// Ticks the dispatcher favors Medium before handing over to High.
pub const DEFAULT_MEDIUM_SLICE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub high_slice: u32,
    pub medium_slice: u32,
    /// Tick at which the clock starts. Shifts every completion time.
    pub start_time: Tick,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            high_slice: DEFAULT_HIGH_SLICE,
            medium_slice: DEFAULT_MEDIUM_SLICE,
            start_time: 0,
        }
    }
}

impl SimConfig {
    pub fn high_slice(mut self, ticks: u32) -> Self {
        self.high_slice = ticks;
        self
    }

    pub fn medium_slice(mut self, ticks: u32) -> Self {
        self.medium_slice = ticks;
        self
    }

    pub fn start_time(mut self, tick: Tick) -> Self {
        self.start_time = tick;
        self
    }

    /// Reject slices that could never run a task.
    pub fn validate(&self) -> Result<()> {
        if self.high_slice == 0 {
            anyhow::bail!("high_slice must be at least 1 tick");
        }
        if self.medium_slice == 0 {
            anyhow::bail!("medium_slice must be at least 1 tick");
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }
}
