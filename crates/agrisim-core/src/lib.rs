//! Simulation clock, registry, and tick cycle for the Agrisim simulation.
//!
//! This crate ties the lower layers together: it owns the crops, actors and
//! pending farm actions, applies player actions, and advances everything
//! through a single non-blocking tick entry point.
//!
//! # Modules
//!
//! - [`clock`] -- Simulated time, game days and season derivation.
//! - [`config`] -- Configuration loading from `agrisim-config.yaml` into
//!   strongly-typed structs.
//! - [`population`] -- Initial farm layout.
//! - [`registry`] -- [`CropRegistry`]: crop ownership and the action entry
//!   point.
//! - [`schedule`] -- Time-ordered queue of removals and replants.
//! - [`tick`] -- The per-tick update cycle.

pub mod clock;
pub mod config;
pub mod population;
pub mod registry;
pub mod schedule;
pub mod tick;

pub use clock::{MAX_STEP_SIM_SECONDS, SIM_SECONDS_PER_TICK, SimClock};
pub use config::SimulationConfig;
pub use population::populate_farm;
pub use registry::{CropRegistry, RegistryError};
pub use tick::{TickError, update};
