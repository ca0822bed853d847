//! Read-only event stream emitted by the tick and action entry points.
//!
//! Presentation collaborators consume these instead of being called from
//! simulation code.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{CropKind, QualityRating, ReportSource, Season, Weather};
use crate::ids::{ActorId, CropId};
use crate::structs::{Position, SimTime};

/// Something observable that happened to a crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type")]
pub enum CropEvent {
    /// A crop was planted (initial population or replant).
    Planted {
        /// New crop.
        crop: CropId,
        /// Species.
        kind: CropKind,
        /// Slot position.
        position: Position,
    },
    /// Growth crossed the harvest threshold.
    Matured {
        /// Crop.
        crop: CropId,
    },
    /// A harvest transition started.
    HarvestStarted {
        /// Crop being harvested.
        crop: CropId,
        /// Harvesting actor.
        actor: ActorId,
        /// Grade of the produce.
        quality: QualityRating,
    },
    /// A harvest transition ran to completion.
    HarvestCompleted {
        /// Harvested crop.
        crop: CropId,
        /// Harvesting actor.
        actor: ActorId,
    },
    /// A harvest transition was stopped early.
    HarvestCancelled {
        /// Crop that was being harvested.
        crop: CropId,
        /// Actor that was harvesting.
        actor: ActorId,
    },
    /// A crop left the farm.
    Removed {
        /// Removed crop.
        crop: CropId,
    },
    /// An advisory report was delivered to a crop.
    AdvisoryReady {
        /// Recipient crop.
        crop: CropId,
        /// Origin of the report text.
        source: ReportSource,
    },
    /// An advisory result arrived for a crop that is gone or harvested.
    AdvisoryDiscarded {
        /// Stale crop.
        crop: CropId,
    },
    /// Refreshed yield text for a harvest, from the pre-harvest snapshot.
    /// Never stored on the crop.
    HarvestYield {
        /// Harvested crop, possibly already removed.
        crop: CropId,
        /// Yield prediction.
        text: String,
        /// Origin of the text.
        source: ReportSource,
    },
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TickSummary {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Simulated time after the tick.
    pub sim_time: SimTime,
    /// Season after the tick.
    pub season: Season,
    /// Weather after the tick.
    pub weather: Weather,
    /// Crops on the farm that are not harvested.
    pub crops_alive: u32,
    /// Events in emission order.
    pub events: Vec<CropEvent>,
}
