//! Environment and species for the Agrisim simulation.
//!
//! # Modules
//!
//! - [`environment`] -- Shared weather/soil state: season-weighted daily
//!   weather plus a bounded per-tick random walk.
//! - [`species`] -- Immutable per-species constants.
//! - [`error`] -- Error types for species lookup and environment setup.

pub mod environment;
pub mod error;
pub mod species;

pub use environment::{EnvironmentModel, WeatherSystem, weather_outlook};
pub use error::WorldError;
pub use species::{CATALOG, CropSpecies, species, species_by_name};
