//! Scheduler tuning, loadable from a TOML file
//!
//! Every field has a default, so a partial file such as
//!
//! ```toml
//! failure_penalty = 0.2
//! mastery_interval = 300
//! ```
//!
//! only overrides what it names.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid scheduler config: {0}")]
    Invalid(String),
}

/// Constants of the review algorithm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub ease_min: f64,
    pub ease_max: f64,
    pub ease_start: f64,
    /// Subtracted from the ease on a failed review
    pub failure_penalty: f64,
    /// Lowest quality that counts as a correct answer
    pub pass_quality: i32,
    /// Interval (days) at which a learning card graduates to review
    pub graduation_interval: u32,
    /// Interval (days) at which a review card becomes mastered
    pub mastery_interval: u32,
    /// Interval after the first success while learning
    pub second_step_interval: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            ease_min: 1.3,
            ease_max: 2.5,
            ease_start: 2.5,
            failure_penalty: 0.15,
            pass_quality: 3,
            graduation_interval: 30,
            mastery_interval: 365,
            second_step_interval: 6,
        }
    }
}

impl SchedulerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SchedulerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; a missing file means defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No scheduler config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.ease_min > 0.0 && self.ease_min <= self.ease_max) {
            return Err(ConfigError::Invalid(format!(
                "ease_min ({}) must be positive and not above ease_max ({})",
                self.ease_min, self.ease_max
            )));
        }
        if self.ease_start < self.ease_min || self.ease_start > self.ease_max {
            return Err(ConfigError::Invalid(format!(
                "ease_start ({}) must lie within [{}, {}]",
                self.ease_start, self.ease_min, self.ease_max
            )));
        }
        if !(0..=5).contains(&self.pass_quality) {
            return Err(ConfigError::Invalid(format!(
                "pass_quality ({}) must be between 0 and 5",
                self.pass_quality
            )));
        }
        if self.failure_penalty < 0.0 {
            return Err(ConfigError::Invalid("failure_penalty must not be negative".to_string()));
        }
        Ok(())
    }

    pub(crate) fn clamp_ease(&self, ease: f64) -> f64 {
        if ease.is_nan() {
            return self.ease_start;
        }
        ease.clamp(self.ease_min, self.ease_max)
    }
}
