//! Crop advisory engine for the Agrisim simulation.
//!
//! Turns a crop snapshot into a human-readable [`AdvisoryReport`]. Reports
//! come from an external language-model service when one is configured and
//! reachable, and from deterministic heuristics otherwise. Every failure
//! mode degrades silently; nothing here ever fails the caller.
//!
//! # Modules
//!
//! - [`advisor`] -- Cache, in-flight coalescing, connectivity ([`Advisor`])
//! - [`config`] -- `advisory` section of the YAML configuration
//! - [`dispatch`] -- Non-blocking tick-side submission ([`AdvisoryDispatcher`])
//! - [`error`] -- Internal failure causes ([`AdvisorError`])
//! - [`heuristics`] -- Deterministic fallback rules
//! - [`llm`] -- HTTP and canned backends
//! - [`parse`] -- Keyword section scan and lenient JSON hints
//! - [`prompt`] -- `minijinja` prompt templates
//! - [`status`] -- Connectivity flag and counters
//! - [`subject`] -- Crop snapshot and cache fingerprint
//!
//! [`AdvisoryReport`]: agrisim_types::AdvisoryReport

pub mod advisor;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod heuristics;
pub mod llm;
pub mod parse;
pub mod prompt;
pub mod status;
pub mod subject;

pub use advisor::Advisor;
pub use config::{AdvisorConfig, BackendType};
pub use dispatch::{AdvisoryDispatcher, Delivery, Submission};
pub use error::AdvisorError;
pub use llm::{CannedBackend, CannedReply, LlmBackend, create_backend};
pub use subject::{AdvisorySubject, Fingerprint};
