//! Error types for the `agrisim-world` crate.

/// Errors from species lookup and environment construction.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// No species with the given name exists in the catalog.
    #[error("unknown species: {0}")]
    UnknownSpecies(String),

    /// An environment field was supplied outside its declared range.
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
}
