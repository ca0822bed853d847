//! Shared type definitions for the Agrisim crop simulation.
//!
//! This crate is the single source of truth for all types used across the
//! Agrisim workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the presentation layer, which only reads them.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for crops and actors
//! - [`enums`] -- Species, seasons, weather, harvest phases, report bands
//! - [`structs`] -- Crop entity, environment, advisory report and status
//! - [`actions`] -- Action kinds and their outcomes
//! - [`events`] -- Crop events and the per-tick summary

pub mod actions;
pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::{ActionKind, ActionOutcome};
pub use enums::{
    ConditionBand, CropKind, HarvestPhase, QualityRating, ReportSource, Season, WaterNeed, Weather,
};
pub use events::{CropEvent, TickSummary};
pub use ids::{ActorId, CropId};
pub use structs::{
    Actor, AdvisoryReport, AdvisoryStatus, CropEntity, EnvironmentState, GeneticVariation,
    Position, SimTime, WeatherOutlook, clamp_percent, clamp_unit,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files land in `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::CropId::export_all();
        let _ = crate::ids::ActorId::export_all();

        // Enums
        let _ = crate::enums::CropKind::export_all();
        let _ = crate::enums::WaterNeed::export_all();
        let _ = crate::enums::Season::export_all();
        let _ = crate::enums::Weather::export_all();
        let _ = crate::enums::HarvestPhase::export_all();
        let _ = crate::enums::QualityRating::export_all();
        let _ = crate::enums::ConditionBand::export_all();
        let _ = crate::enums::ReportSource::export_all();

        // Structs
        let _ = crate::structs::SimTime::export_all();
        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::GeneticVariation::export_all();
        let _ = crate::structs::CropEntity::export_all();
        let _ = crate::structs::EnvironmentState::export_all();
        let _ = crate::structs::WeatherOutlook::export_all();
        let _ = crate::structs::AdvisoryReport::export_all();
        let _ = crate::structs::AdvisoryStatus::export_all();
        let _ = crate::structs::Actor::export_all();

        // Actions and events
        let _ = crate::actions::ActionKind::export_all();
        let _ = crate::actions::ActionOutcome::export_all();
        let _ = crate::events::CropEvent::export_all();
        let _ = crate::events::TickSummary::export_all();
    }
}
