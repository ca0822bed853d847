//! Enumeration types for the Agrisim simulation.
//!
//! Species, weather, harvest phases and the qualitative bands used by the
//! advisory and harvest reports.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Species
// ---------------------------------------------------------------------------

/// A crop species that can be planted on the farm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum CropKind {
    /// Cereal grass grown for grain.
    Wheat,
    /// Tall cereal grown for ears.
    Corn,
    /// Vine fruit grown on stakes.
    Tomato,
    /// Fast leafy green.
    Lettuce,
    /// Root vegetable.
    Carrot,
}

impl CropKind {
    /// Every species, in catalog order.
    pub const ALL: [Self; 5] = [
        Self::Wheat,
        Self::Corn,
        Self::Tomato,
        Self::Lettuce,
        Self::Carrot,
    ];

    /// Lowercase display name, as used in prompts and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wheat => "wheat",
            Self::Corn => "corn",
            Self::Tomato => "tomato",
            Self::Lettuce => "lettuce",
            Self::Carrot => "carrot",
        }
    }

    /// Species grown on the given plot index (plots cycle through the catalog).
    pub const fn for_plot(plot: usize) -> Self {
        match plot % 5 {
            0 => Self::Wheat,
            1 => Self::Corn,
            2 => Self::Tomato,
            3 => Self::Lettuce,
            _ => Self::Carrot,
        }
    }
}

impl core::fmt::Display for CropKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// How thirsty a species is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum WaterNeed {
    /// Tolerates dry soil.
    Low,
    /// Regular watering.
    Medium,
    /// Needs consistently moist soil.
    High,
}

impl WaterNeed {
    /// Lowercase label used in advisory prompts.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

// ---------------------------------------------------------------------------
// Seasons and weather
// ---------------------------------------------------------------------------

/// A season in the simulation's annual cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum Season {
    /// Mild, wet.
    Spring,
    /// Hot, dry.
    Summer,
    /// Cooling, windy.
    Autumn,
    /// Cold.
    Winter,
}

impl Season {
    /// The season that follows this one.
    pub const fn next(self) -> Self {
        match self {
            Self::Spring => Self::Summer,
            Self::Summer => Self::Autumn,
            Self::Autumn => Self::Winter,
            Self::Winter => Self::Spring,
        }
    }

    /// Season at `offset` steps after `self`, wrapping through the year.
    pub const fn advanced_by(self, offset: u64) -> Self {
        let mut season = self;
        let mut remaining = offset % 4;
        while remaining > 0 {
            season = season.next();
            remaining = remaining.saturating_sub(1);
        }
        season
    }
}

/// Daily weather condition. Biases the environment's random walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    /// Clear skies, temperature drifts upward.
    Sunny,
    /// No bias.
    Cloudy,
    /// Humidity drifts upward, temperature downward.
    Rain,
    /// Wind and humidity drift upward.
    Storm,
}

// ---------------------------------------------------------------------------
// Harvest
// ---------------------------------------------------------------------------

/// Phase of a harvest transition. Ordered by progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum HarvestPhase {
    /// Actor walks to the crop.
    Approach,
    /// Actor crouches and cuts.
    Harvest,
    /// Actor stands back up with the produce.
    Collect,
    /// Actor idles until the sequence finishes.
    Return,
}

impl HarvestPhase {
    /// Phase for a progress fraction `p` of the full transition.
    pub fn from_progress(p: f64) -> Self {
        if p < 0.3 {
            Self::Approach
        } else if p < 0.7 {
            Self::Harvest
        } else if p < 0.9 {
            Self::Collect
        } else {
            Self::Return
        }
    }
}

/// Quality grade assigned to a crop when it is harvested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum QualityRating {
    /// Composite below 40.
    Poor,
    /// Composite 40 to 60.
    Fair,
    /// Composite 60 to 75.
    Good,
    /// Composite 75 to 90.
    Excellent,
    /// Composite 90 and above.
    Premium,
}

impl QualityRating {
    /// Grade a composite score on the 0--100 scale.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Premium
        } else if score >= 75.0 {
            Self::Excellent
        } else if score >= 60.0 {
            Self::Good
        } else if score >= 40.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

// ---------------------------------------------------------------------------
// Advisory
// ---------------------------------------------------------------------------

/// Overall condition band of an advisory report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ConditionBand {
    /// Composite below 40.
    Critical,
    /// Composite 40 to 60.
    Poor,
    /// Composite 60 to 75.
    Fair,
    /// Composite 75 to 90.
    Good,
    /// Composite 90 and above.
    Excellent,
}

impl ConditionBand {
    /// Band for a composite score on the 0--100 scale.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Excellent
        } else if score >= 75.0 {
            Self::Good
        } else if score >= 60.0 {
            Self::Fair
        } else if score >= 40.0 {
            Self::Poor
        } else {
            Self::Critical
        }
    }

    /// Display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Poor => "Poor",
            Self::Fair => "Fair",
            Self::Good => "Good",
            Self::Excellent => "Excellent",
        }
    }
}

/// Where the text of an advisory report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ReportSource {
    /// Parsed from the external service's reply (unmatched fields backfilled).
    Service,
    /// Built entirely from deterministic heuristics.
    Fallback,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plots_cycle_through_species() {
        assert_eq!(CropKind::for_plot(0), CropKind::Wheat);
        assert_eq!(CropKind::for_plot(3), CropKind::Lettuce);
        assert_eq!(CropKind::for_plot(5), CropKind::Wheat);
    }

    #[test]
    fn phase_boundaries() {
        assert_eq!(HarvestPhase::from_progress(0.0), HarvestPhase::Approach);
        assert_eq!(HarvestPhase::from_progress(0.3), HarvestPhase::Harvest);
        assert_eq!(HarvestPhase::from_progress(0.69), HarvestPhase::Harvest);
        assert_eq!(HarvestPhase::from_progress(0.7), HarvestPhase::Collect);
        assert_eq!(HarvestPhase::from_progress(0.9), HarvestPhase::Return);
        assert_eq!(HarvestPhase::from_progress(1.5), HarvestPhase::Return);
    }

    #[test]
    fn phases_are_ordered() {
        assert!(HarvestPhase::Approach < HarvestPhase::Harvest);
        assert!(HarvestPhase::Collect < HarvestPhase::Return);
    }

    #[test]
    fn bands_and_ratings() {
        assert_eq!(ConditionBand::from_score(39.9), ConditionBand::Critical);
        assert_eq!(ConditionBand::from_score(45.0), ConditionBand::Poor);
        assert_eq!(ConditionBand::from_score(90.0), ConditionBand::Excellent);
        assert_eq!(QualityRating::from_score(75.0), QualityRating::Excellent);
        assert_eq!(QualityRating::from_score(10.0), QualityRating::Poor);
    }

    #[test]
    fn season_wraps() {
        assert_eq!(Season::Winter.next(), Season::Spring);
        assert_eq!(Season::Summer.advanced_by(6), Season::Winter);
    }

    #[test]
    fn kinds_serialize_lowercase() {
        let json = serde_json::to_string(&CropKind::Lettuce).ok();
        assert_eq!(json.as_deref(), Some("\"lettuce\""));
    }
}
