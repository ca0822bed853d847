//! Simulation clock for the Agrisim simulation.
//!
//! The clock is the single source of truth for simulated time. It counts
//! ticks, accumulates simulated seconds, and derives the game day and season
//! from them.
//!
//! # Design Principles
//!
//! - One nominal tick covers [`SIM_SECONDS_PER_TICK`] simulated seconds.
//!   Growth rates are per simulated second and no other scaling exists.
//! - A single step never exceeds [`MAX_STEP_SIM_SECONDS`]; NaN, infinite and
//!   negative steps count as zero.
//! - Day and season are computed from accumulated time, never stored
//!   independently.
//! - The tick counter uses checked arithmetic.

use agrisim_crops::sanitize_dt;
use agrisim_types::{Season, SimTime};

use crate::config::TimeConfig;

/// Simulated seconds covered by one nominal host tick.
pub const SIM_SECONDS_PER_TICK: f64 = 0.1;

/// Upper bound on the simulated time a single tick may advance.
pub const MAX_STEP_SIM_SECONDS: f64 = 1.0;

/// Season the simulation starts in.
const FIRST_SEASON: Season = Season::Spring;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid time configuration (e.g. zero days per season).
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Clamp a requested step to `[0, MAX_STEP_SIM_SECONDS]`.
pub fn clamp_step(elapsed: f64) -> f64 {
    sanitize_dt(elapsed).min(MAX_STEP_SIM_SECONDS)
}

/// Simulation clock tracking ticks and simulated seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct SimClock {
    /// Ticks completed so far.
    tick: u64,

    /// Simulated seconds since the start.
    now: SimTime,

    /// Simulated seconds per game day.
    sim_seconds_per_day: f64,

    /// Game days per season.
    days_per_season: u64,
}

impl SimClock {
    /// Create a clock at tick 0 from a time configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the day length is not a
    /// positive number or a season has no days.
    pub fn new(config: &TimeConfig) -> Result<Self, ClockError> {
        Self::from_parts(0, SimTime::ZERO, config.sim_seconds_per_day, config.days_per_season)
    }

    /// Create a clock from explicit parameters (useful for testing and
    /// state restoration).
    ///
    /// # Errors
    ///
    /// Same conditions as [`SimClock::new`].
    pub fn from_parts(
        tick: u64,
        now: SimTime,
        sim_seconds_per_day: f64,
        days_per_season: u64,
    ) -> Result<Self, ClockError> {
        if !sim_seconds_per_day.is_finite() || sim_seconds_per_day <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: "sim_seconds_per_day must be a positive number".to_owned(),
            });
        }
        if days_per_season == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "days_per_season must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            tick,
            now: SimTime(now.seconds().max(0.0)),
            sim_seconds_per_day,
            days_per_season,
        })
    }

    /// Advance by one tick covering `elapsed` simulated seconds, clamped.
    /// Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self, elapsed: f64) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        self.now = self.now.after(clamp_step(elapsed));
        Ok(self.tick)
    }

    /// Ticks completed so far.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Current simulated time.
    pub const fn now(&self) -> SimTime {
        self.now
    }

    /// Simulated seconds per game day.
    pub const fn sim_seconds_per_day(&self) -> f64 {
        self.sim_seconds_per_day
    }

    /// Game day index, starting at 0.
    // Non-negative and finite by construction; the cast saturates.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn day(&self) -> u64 {
        (self.now.seconds() / self.sim_seconds_per_day).floor() as u64
    }

    /// Season derived from the current day.
    pub fn season(&self) -> Season {
        FIRST_SEASON.advanced_by(self.day().checked_div(self.days_per_season).unwrap_or(0))
    }
}
