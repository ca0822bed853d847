//! Core data structures shared across the simulation.
//!
//! Percentages are `f64` on the 0--100 scale and are kept in range by the
//! clamping helpers at the bottom of this module. Every mutation site in the
//! simulation routes through them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ConditionBand, CropKind, ReportSource, Season, Weather};
use crate::ids::{ActorId, CropId};

// ---------------------------------------------------------------------------
// Simulated time
// ---------------------------------------------------------------------------

/// A point on the simulated time line, in simulated seconds since start.
///
/// Negative values are instants before the simulation started, such as the
/// planting time of crops that were already growing on the initial farm.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SimTime(pub f64);

impl SimTime {
    /// The start of the simulation.
    pub const ZERO: Self = Self(0.0);

    /// Simulated seconds since the start.
    pub const fn seconds(self) -> f64 {
        self.0
    }

    /// This instant shifted `seconds` into the future.
    pub fn after(self, seconds: f64) -> Self {
        Self(self.0 + seconds)
    }

    /// Seconds elapsed from `earlier` to `self`, never negative.
    pub fn since(self, earlier: Self) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// World-space position. `y` is the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// East-west.
    pub x: f64,
    /// Height.
    pub y: f64,
    /// North-south.
    pub z: f64,
}

impl Position {
    /// Construct a position.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Horizontal (x/z plane) distance to `other`.
    pub fn horizontal_distance(&self, other: &Self) -> f64 {
        (other.x - self.x).hypot(other.z - self.z)
    }
}

// ---------------------------------------------------------------------------
// Crops
// ---------------------------------------------------------------------------

/// Per-plant multipliers fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeneticVariation {
    /// Multiplier on the base growth rate (around 1.0).
    pub growth_rate_modifier: f64,
    /// 0 = no resistance, 1 = immune to disease progression.
    pub disease_resistance: f64,
    /// Cosmetic height multiplier.
    pub height_variation: f64,
    /// Cosmetic hue offset.
    pub color_variation: f64,
    /// Cosmetic leaf density multiplier.
    pub leaf_count: f64,
}

impl Default for GeneticVariation {
    fn default() -> Self {
        Self {
            growth_rate_modifier: 1.0,
            disease_resistance: 0.5,
            height_variation: 1.0,
            color_variation: 0.0,
            leaf_count: 1.0,
        }
    }
}

/// A planted crop and its vitals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CropEntity {
    /// Unique identifier.
    pub id: CropId,
    /// Species.
    pub kind: CropKind,
    /// Where the plant stands.
    pub position: Position,
    /// Maturity, 0--100. Harvestable at 80.
    pub growth: f64,
    /// 0--100.
    pub health: f64,
    /// Water held by the plant, 0--100.
    pub water_level: f64,
    /// 0--100.
    pub soil_moisture: f64,
    /// 0--100.
    pub nutrient_level: f64,
    /// 0--100.
    pub disease_level: f64,
    /// Accumulated weather penalty, 0--1.
    pub environmental_stress: f64,
    /// Last time the crop was watered.
    pub last_watered_at: SimTime,
    /// When the crop was planted.
    pub planted_at: SimTime,
    /// Set once a harvest starts. Only removal is valid afterwards.
    pub harvested: bool,
    /// Most recent advisory report delivered for this crop.
    pub last_advisory: Option<AdvisoryReport>,
    /// Fixed multipliers.
    pub genetics: GeneticVariation,
}

impl CropEntity {
    /// Force every vital back into its declared range.
    pub fn clamp_vitals(&mut self) {
        self.growth = clamp_percent(self.growth);
        self.health = clamp_percent(self.health);
        self.water_level = clamp_percent(self.water_level);
        self.soil_moisture = clamp_percent(self.soil_moisture);
        self.nutrient_level = clamp_percent(self.nutrient_level);
        self.disease_level = clamp_percent(self.disease_level);
        self.environmental_stress = clamp_unit(self.environmental_stress);
    }

    /// Whether every vital is within its declared range.
    pub fn vitals_in_range(&self) -> bool {
        [
            self.growth,
            self.health,
            self.water_level,
            self.soil_moisture,
            self.nutrient_level,
            self.disease_level,
        ]
        .iter()
        .all(|v| (0.0..=100.0).contains(v))
            && (0.0..=1.0).contains(&self.environmental_stress)
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Shared weather and soil state. One writer (the tick), many readers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EnvironmentState {
    /// Air temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Wind speed in km/h.
    pub wind_speed: f64,
    /// 0--1.
    pub soil_quality: f64,
    /// Current season.
    pub season: Season,
    /// Today's weather.
    pub weather: Weather,
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self {
            temperature: 22.0,
            humidity: 65.0,
            wind_speed: 5.0,
            soil_quality: 0.7,
            season: Season::Summer,
            weather: Weather::Sunny,
        }
    }
}

/// Deterministic weather-impact outlook for the current environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WeatherOutlook {
    /// Effect on growth speed.
    pub growth_impact: String,
    /// Disease pressure.
    pub disease_risk: String,
    /// Irrigation demand.
    pub water_needs: String,
    /// Standing advice.
    pub recommendations: String,
}

// ---------------------------------------------------------------------------
// Advisory
// ---------------------------------------------------------------------------

/// A structured textual analysis of a crop. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AdvisoryReport {
    /// Overall condition text.
    pub condition: String,
    /// Band the condition was derived from.
    pub condition_band: ConditionBand,
    /// Single most pressing action.
    pub urgent_action: String,
    /// Longer-term care suggestions.
    pub recommendations: String,
    /// Disease and pest advice.
    pub disease_management: String,
    /// Expected yield text.
    pub yield_prediction: String,
    /// Expected time to harvest.
    pub timeline: String,
    /// 0--100.
    pub confidence: u8,
    /// Whether the text came from the service or the heuristics.
    pub source: ReportSource,
    /// Wall-clock creation time.
    pub generated_at: DateTime<Utc>,
}

/// Read-only connectivity and usage counters of the advisory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AdvisoryStatus {
    /// Last request or probe succeeded.
    pub connected: bool,
    /// A usable credential was configured at startup.
    pub has_credential: bool,
    /// Analysis and hint requests issued (probes excluded).
    pub request_count: u64,
    /// Requests that failed, timed out or returned malformed text.
    pub failure_count: u64,
    /// When the last request was issued.
    pub last_request_time: Option<DateTime<Utc>>,
    /// Model identifier sent with each request.
    pub model: String,
}

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

/// Someone who walks the farm and harvests crops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Actor {
    /// Unique identifier.
    pub id: ActorId,
    /// Current position.
    pub position: Position,
    /// Heading around the vertical axis, radians.
    pub yaw: f64,
    /// Resting height of the actor's origin.
    pub ground_level: f64,
}

impl Actor {
    /// A new actor standing at `position`.
    pub fn new(position: Position) -> Self {
        Self {
            id: ActorId::new(),
            position,
            yaw: 0.0,
            ground_level: position.y,
        }
    }
}

// ---------------------------------------------------------------------------
// Clamping
// ---------------------------------------------------------------------------

/// Clamp to 0--100. NaN collapses to 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) }
}

/// Clamp to 0--1. NaN collapses to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
