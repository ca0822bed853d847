//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the tick loop so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: agrisim_core::config::ConfigError,
    },

    /// The advisory engine could not be built.
    #[error("advisor error: {source}")]
    Advisor {
        /// The underlying advisor error.
        #[from]
        source: agrisim_advisor::AdvisorError,
    },

    /// The registry could not be built.
    #[error("registry error: {source}")]
    Registry {
        /// The underlying registry error.
        #[from]
        source: agrisim_core::RegistryError,
    },

    /// A tick failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: agrisim_core::TickError,
    },
}
