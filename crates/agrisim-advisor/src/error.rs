//! Error types for the advisory engine.
//!
//! Uses `thiserror` for typed errors that surface through the request
//! pipeline: prompt rendering, HTTP transport, reply extraction and
//! parsing. None of these leave the crate's public `analyze` boundary; the
//! engine logs them and degrades to the deterministic heuristics.

/// Errors that can occur while producing an advisory report.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdvisorError {
    /// The HTTP request could not be sent or the body could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for logging.
        body: String,
    },

    /// The reply was empty or matched none of the expected sections.
    #[error("malformed reply: {0}")]
    Malformed(String),

    /// The request exceeded its deadline.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// No usable credential, so the network path is disabled.
    #[error("advisory service disabled: no credential")]
    Disabled,

    /// Failed to render a prompt template.
    #[error("template render error: {0}")]
    Template(String),

    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(String),
}

impl From<serde_json::Error> for AdvisorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

impl From<minijinja::Error> for AdvisorError {
    fn from(err: minijinja::Error) -> Self {
        Self::Template(err.to_string())
    }
}
