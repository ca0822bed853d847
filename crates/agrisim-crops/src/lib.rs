//! Crop lifecycle logic for the Agrisim simulation.
//!
//! Everything here operates on crop state without touching I/O. It sits
//! between `agrisim-types` (data structures) and `agrisim-core`
//! (registry and tick orchestration).
//!
//! # Modules
//!
//! - [`actions`] -- Action validation and handlers (water, fertilize, treat, harvest).
//! - [`config`] -- Tunable growth and harvest parameters ([`GrowthConfig`], [`HarvestConfig`])
//! - [`entity`] -- Crop construction, genetics, and planting-age helpers
//! - [`error`] -- Action rejections ([`CropError`])
//! - [`growth`] -- Per-tick growth/decay mechanics ([`advance`])
//! - [`transition`] -- Timed harvest state machine ([`HarvestTransitions`])

pub mod actions;
pub mod config;
pub mod entity;
pub mod error;
pub mod growth;
pub mod transition;

// Re-export primary types at crate root for convenience.
pub use actions::handlers::{fertilize, mark_harvested, quality_rating, treat, water};
pub use actions::validation::{ensure_active, validate_harvest};
pub use config::{GrowthConfig, HarvestConfig};
pub use entity::{
    days_planted, days_to_maturity, established, genetics_from_hint, random_genetics, seedling,
};
pub use error::CropError;
pub use growth::{GrowthTickResult, advance, sanitize_dt};
pub use transition::{
    CompletionCallback, HarvestCompletion, HarvestTransition, HarvestTransitions,
    TransitionReport, TransitionStatus,
};
