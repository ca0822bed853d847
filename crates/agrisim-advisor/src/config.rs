//! Configuration for the advisory engine.
//!
//! Corresponds to the `advisory` section of `agrisim-config.yaml`. The
//! service credential is never stored in the file: it is read from the
//! environment variable named by [`AdvisorConfig::credential_env`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Supported LLM backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// `OpenAI`-compatible chat completions API (`OpenAI`, Groq, Ollama).
    OpenAi,
    /// Anthropic Messages API (different request format).
    Anthropic,
    /// Offline backend replaying [`AdvisorConfig::canned_reply`].
    Canned,
}

/// Advisory engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Backend wire format (default: `openai`).
    #[serde(default = "default_backend")]
    pub backend: BackendType,

    /// Base API URL (default: `https://api.groq.com/openai/v1`).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model identifier sent with every request (default: `llama3-8b-8192`).
    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound on a single request, in milliseconds (default: 10000).
    ///
    /// Measured in wall-clock time, not simulated time: the request runs
    /// off the tick thread and does not advance with the farm clock.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Minimum spacing between connectivity probes after a failure (default: 30000).
    #[serde(default = "default_reprobe_interval_ms")]
    pub reprobe_interval_ms: u64,

    /// Directory with prompt template overrides. Built-in templates are
    /// used for any file it does not contain.
    #[serde(default)]
    pub templates_dir: Option<String>,

    /// Environment variable holding the API key (default: `ADVISOR_API_KEY`).
    #[serde(default = "default_credential_env")]
    pub credential_env: String,

    /// Reply replayed by the `canned` backend.
    #[serde(default)]
    pub canned_reply: Option<String>,
}

fn default_backend() -> BackendType {
    BackendType::OpenAi
}

fn default_api_url() -> String {
    "https://api.groq.com/openai/v1".to_owned()
}

fn default_model() -> String {
    "llama3-8b-8192".to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    10_000
}

const fn default_reprobe_interval_ms() -> u64 {
    30_000
}

fn default_credential_env() -> String {
    "ADVISOR_API_KEY".to_owned()
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            api_url: default_api_url(),
            model: default_model(),
            request_timeout_ms: default_request_timeout_ms(),
            reprobe_interval_ms: default_reprobe_interval_ms(),
            templates_dir: None,
            credential_env: default_credential_env(),
            canned_reply: None,
        }
    }
}

impl AdvisorConfig {
    /// Request deadline as a [`Duration`].
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Probe spacing as a [`Duration`].
    pub const fn reprobe_interval(&self) -> Duration {
        Duration::from_millis(self.reprobe_interval_ms)
    }

    /// Read the credential from the configured environment variable.
    ///
    /// Returns `None` when the variable is unset, empty or the literal
    /// string `undefined`.
    pub fn resolve_credential(&self) -> Option<String> {
        std::env::var(&self.credential_env)
            .ok()
            .and_then(|value| usable_credential(&value))
    }
}

/// Normalize a raw credential value, rejecting placeholders.
pub fn usable_credential(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "undefined" {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
