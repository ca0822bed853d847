//! Configuration loading and typed config structures for the Agrisim simulation.
//!
//! The canonical configuration lives in `agrisim-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads the file. Every section and
//! field is optional; a missing file yields the defaults.

use std::path::Path;

use agrisim_advisor::AdvisorConfig;
use agrisim_crops::{GrowthConfig, HarvestConfig};
use serde::Deserialize;

/// Environment variable that may point at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "AGRISIM_CONFIG";

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "agrisim-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is unusable.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `agrisim-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, tick pacing).
    #[serde(default)]
    pub world: WorldConfig,

    /// Simulated day and season lengths.
    #[serde(default)]
    pub time: TimeConfig,

    /// Initial farm layout.
    #[serde(default)]
    pub farm: FarmConfig,

    /// Growth/decay rates and action magnitudes.
    #[serde(default)]
    pub growth: GrowthConfig,

    /// Harvest preconditions and delays.
    #[serde(default)]
    pub harvest: HarvestConfig,

    /// Advisory service settings.
    #[serde(default)]
    pub advisory: AdvisorConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if it is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `$AGRISIM_CONFIG`, else `agrisim-config.yaml` if it
    /// exists, else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error only if a file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());
        let path = Path::new(&path);
        if path.is_file() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.time.sim_seconds_per_day.is_nan() || self.time.sim_seconds_per_day <= 0.0 {
            return Err(ConfigError::Invalid(
                "time.sim_seconds_per_day must be positive".to_owned(),
            ));
        }
        if self.time.days_per_season == 0 {
            return Err(ConfigError::Invalid(
                "time.days_per_season must be at least 1".to_owned(),
            ));
        }
        if !(0.0..=1.0).contains(&self.farm.fill_ratio) {
            return Err(ConfigError::Invalid(
                "farm.fill_ratio must be within 0..=1".to_owned(),
            ));
        }
        if self.harvest.transition_seconds.is_nan() || self.harvest.transition_seconds <= 0.0 {
            return Err(ConfigError::Invalid(
                "harvest.transition_seconds must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds between host ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Ticks the headless host runs before stopping. 0 runs until interrupted.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: default_max_ticks(),
        }
    }
}

/// Simulated day and season lengths.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeConfig {
    /// Simulated seconds in one game day.
    #[serde(default = "default_sim_seconds_per_day")]
    pub sim_seconds_per_day: f64,

    /// Game days per season.
    #[serde(default = "default_days_per_season")]
    pub days_per_season: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            sim_seconds_per_day: default_sim_seconds_per_day(),
            days_per_season: default_days_per_season(),
        }
    }
}

/// Initial farm layout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FarmConfig {
    /// Number of plots. Plot `i` grows species `i mod 5`.
    #[serde(default = "default_plots")]
    pub plots: usize,

    /// Rows per plot.
    #[serde(default = "default_rows")]
    pub rows: usize,

    /// Columns per plot.
    #[serde(default = "default_columns")]
    pub columns: usize,

    /// Probability that a slot is planted.
    #[serde(default = "default_fill_ratio")]
    pub fill_ratio: f64,

    /// Distance between neighbouring columns.
    #[serde(default = "default_column_spacing")]
    pub column_spacing: f64,

    /// Distance between neighbouring rows.
    #[serde(default = "default_row_spacing")]
    pub row_spacing: f64,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            plots: default_plots(),
            rows: default_rows(),
            columns: default_columns(),
            fill_ratio: default_fill_ratio(),
            column_spacing: default_column_spacing(),
            row_spacing: default_row_spacing(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Green Valley".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    100
}

const fn default_max_ticks() -> u64 {
    6000
}

const fn default_sim_seconds_per_day() -> f64 {
    120.0
}

const fn default_days_per_season() -> u64 {
    30
}

const fn default_plots() -> usize {
    4
}

const fn default_rows() -> usize {
    6
}

const fn default_columns() -> usize {
    8
}

const fn default_fill_ratio() -> f64 {
    0.8
}

const fn default_column_spacing() -> f64 {
    2.5
}

const fn default_row_spacing() -> f64 {
    3.0
}
