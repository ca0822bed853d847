//! Error types for the `agrisim-crops` crate.
//!
//! Every variant is a recoverable rejection: the crop and actor are left
//! exactly as they were.

use agrisim_types::{ActorId, CropId};

/// Reasons an action on a crop was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CropError {
    /// No crop with this ID is on the farm.
    #[error("crop not found: {0}")]
    CropNotFound(CropId),

    /// The crop has been harvested; only removal is valid.
    #[error("crop {0} is already harvested")]
    AlreadyHarvested(CropId),

    /// Growth is below the harvest threshold.
    #[error("crop is not ready for harvest (growth {growth:.1})")]
    NotReady {
        /// Current growth.
        growth: f64,
    },

    /// Health is too low to harvest.
    #[error("crop is too unhealthy to harvest (health {health:.1})")]
    TooUnhealthy {
        /// Current health.
        health: f64,
    },

    /// The actor already has a harvest in progress.
    #[error("actor {actor} is busy with another harvest")]
    Busy {
        /// The busy actor.
        actor: ActorId,
    },

    /// No actor with this ID exists.
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),
}
