//! Player action kinds and the outcomes returned by the action entry point.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::QualityRating;
use crate::ids::ActorId;
use crate::structs::AdvisoryReport;

// ---------------------------------------------------------------------------
// Action kinds
// ---------------------------------------------------------------------------

/// A discrete action a player can take on a crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Add water to the plant and soil.
    Water,
    /// Add nutrients.
    Fertilize,
    /// Apply disease treatment.
    Treat,
    /// Start a harvest transition.
    Harvest,
    /// Read vitals and the latest advisory.
    Inspect,
    /// Request a fresh advisory report.
    Analyze,
}

impl ActionKind {
    /// Parse a tool name as used by input collaborators.
    ///
    /// Case-insensitive. Accepts the legacy aliases `fix` (treat) and
    /// `ai_analyze` (analyze).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "water" => Some(Self::Water),
            "fertilize" => Some(Self::Fertilize),
            "treat" | "fix" => Some(Self::Treat),
            "harvest" => Some(Self::Harvest),
            "inspect" => Some(Self::Inspect),
            "analyze" | "ai_analyze" => Some(Self::Analyze),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Fertilize => "fertilize",
            Self::Treat => "treat",
            Self::Harvest => "harvest",
            Self::Inspect => "inspect",
            Self::Analyze => "analyze",
        }
    }
}

impl core::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Successful result of an action. Rejections are reported as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ActionOutcome {
    /// Water was applied.
    Watered {
        /// Amount added to the water level.
        amount: f64,
        /// Resulting water level.
        water_level: f64,
        /// Resulting soil moisture.
        soil_moisture: f64,
    },
    /// Fertilizer was applied.
    Fertilized {
        /// Resulting nutrient level.
        nutrient_level: f64,
    },
    /// Treatment was applied.
    Treated {
        /// Rolled effectiveness, 60--90.
        effectiveness: f64,
        /// Resulting health.
        health: f64,
        /// Resulting disease level.
        disease_level: f64,
    },
    /// A harvest transition started.
    HarvestStarted {
        /// Actor performing the harvest.
        actor: ActorId,
        /// Grade of the produce.
        quality: QualityRating,
        /// Yield text at the moment of harvest.
        yield_prediction: String,
    },
    /// Vitals were read.
    Inspected {
        /// Simulated days since planting.
        days_planted: f64,
        /// Simulated days until the species' nominal maturity.
        days_to_maturity: f64,
        /// Last advisory delivered for the crop, if any.
        last_advisory: Option<AdvisoryReport>,
    },
    /// An advisory report was available immediately.
    Analyzed(AdvisoryReport),
    /// An advisory request is in flight. The report arrives on a later tick.
    AnalysisPending,
}
