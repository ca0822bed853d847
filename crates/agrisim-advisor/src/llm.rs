//! LLM backend abstraction and implementations.
//!
//! Defines an enum-based dispatch for LLM backends, avoiding the
//! dyn-compatibility issues with async trait methods. Concrete
//! implementations exist for OpenAI-compatible APIs and the Anthropic
//! Messages API, plus an offline [`CannedBackend`] that replays a fixed
//! reply for tests and offline runs.
//!
//! The advisor does not care which model is behind the API -- it sends a
//! prompt and expects free text back.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::{AdvisorConfig, BackendType};
use crate::error::AdvisorError;
use crate::prompt::RenderedPrompt;

// ---------------------------------------------------------------------------
// Unified backend enum (dyn-compatible alternative to async trait)
// ---------------------------------------------------------------------------

/// An LLM backend that can process a prompt and return a response.
///
/// Uses enum dispatch instead of trait objects because async methods
/// are not dyn-compatible in Rust.
#[derive(Debug)]
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi(HttpBackend),
    /// Anthropic Messages API.
    Anthropic(HttpBackend),
    /// Fixed reply, no network.
    Canned(CannedBackend),
}

impl LlmBackend {
    /// Send a prompt to the LLM and return the response text.
    ///
    /// # Errors
    ///
    /// Returns [`AdvisorError::Transport`] or [`AdvisorError::Status`] if the
    /// HTTP call fails, and [`AdvisorError::Malformed`] if the response
    /// body has no text content.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, AdvisorError> {
        match self {
            Self::OpenAi(backend) => backend.complete_openai(prompt).await,
            Self::Anthropic(backend) => backend.complete_anthropic(prompt).await,
            Self::Canned(backend) => backend.complete().await,
        }
    }

    /// Whether the backend was built from a resolved credential. Only the
    /// HTTP backends are; the canned backend needs none.
    pub const fn holds_credential(&self) -> bool {
        matches!(self, Self::OpenAi(_) | Self::Anthropic(_))
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
            Self::Canned(_) => "canned",
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP backends
// ---------------------------------------------------------------------------

/// Connection details shared by the HTTP backends.
#[derive(Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpBackend {
    /// Create a backend for `api_url` authenticating with `api_key`.
    pub fn new(api_url: &str, api_key: String, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_owned(),
            api_key,
            model: model.to_owned(),
        }
    }

    /// Send to `{api_url}/chat/completions`.
    async fn complete_openai(&self, prompt: &RenderedPrompt) -> Result<String, AdvisorError> {
        let url = format!("{}/chat/completions", self.api_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ],
            "temperature": prompt.temperature,
            "max_tokens": prompt.max_tokens
        });

        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body);

        let json = send_json(request, "OpenAI").await?;
        extract_openai_content(&json)
    }

    /// Send to `{api_url}/messages`.
    async fn complete_anthropic(&self, prompt: &RenderedPrompt) -> Result<String, AdvisorError> {
        let url = format!("{}/messages", self.api_url);

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": prompt.max_tokens,
            "temperature": prompt.temperature,
            "system": prompt.system,
            "messages": [
                {"role": "user", "content": prompt.user}
            ]
        });

        let request = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body);

        let json = send_json(request, "Anthropic").await?;
        extract_anthropic_content(&json)
    }
}

/// Send a prepared request and decode the JSON body of a success response.
async fn send_json(
    request: reqwest::RequestBuilder,
    label: &str,
) -> Result<serde_json::Value, AdvisorError> {
    let response = request
        .send()
        .await
        .map_err(|e| AdvisorError::Transport(format!("{label} request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(AdvisorError::Status {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| AdvisorError::Transport(format!("{label} response parse failed: {e}")))
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, AdvisorError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            AdvisorError::Malformed("OpenAI response missing choices[0].message.content".to_owned())
        })
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &serde_json::Value) -> Result<String, AdvisorError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            AdvisorError::Malformed("Anthropic response missing content[0].text".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Canned backend
// ---------------------------------------------------------------------------

/// One scripted answer of a [`CannedBackend`].
#[derive(Debug, Clone)]
pub struct CannedReply {
    text: Result<String, AdvisorError>,
    delay: Option<Duration>,
}

impl CannedReply {
    /// Answer with `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Ok(text.into()),
            delay: None,
        }
    }

    /// Fail with `error`.
    pub const fn error(error: AdvisorError) -> Self {
        Self {
            text: Err(error),
            delay: None,
        }
    }

    /// Wait `delay` before answering.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Replays scripted replies in order, then repeats a final one forever.
#[derive(Debug)]
pub struct CannedBackend {
    script: Mutex<VecDeque<CannedReply>>,
    repeat: CannedReply,
}

impl CannedBackend {
    /// Always answer with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::scripted(Vec::new(), CannedReply::text(text))
    }

    /// Always fail with `error`.
    pub fn failing(error: AdvisorError) -> Self {
        Self::scripted(Vec::new(), CannedReply::error(error))
    }

    /// Answer with `first` in order, then with `repeat`.
    pub fn scripted(first: Vec<CannedReply>, repeat: CannedReply) -> Self {
        Self {
            script: Mutex::new(first.into()),
            repeat,
        }
    }

    async fn complete(&self) -> Result<String, AdvisorError> {
        let next = {
            let mut script = match self.script.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            script.pop_front()
        }
        .unwrap_or_else(|| self.repeat.clone());

        if let Some(delay) = next.delay {
            tokio::time::sleep(delay).await;
        }
        next.text
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create an LLM backend from configuration.
///
/// HTTP backends need a credential; without one the network path is
/// disabled and `None` is returned. The canned backend needs none and
/// replays the configured reply (an empty reply counts as malformed).
pub fn create_backend(config: &AdvisorConfig, credential: Option<String>) -> Option<LlmBackend> {
    match config.backend {
        BackendType::OpenAi => credential
            .map(|key| LlmBackend::OpenAi(HttpBackend::new(&config.api_url, key, &config.model))),
        BackendType::Anthropic => credential
            .map(|key| LlmBackend::Anthropic(HttpBackend::new(&config.api_url, key, &config.model))),
        BackendType::Canned => Some(LlmBackend::Canned(CannedBackend::replying(
            config.canned_reply.clone().unwrap_or_default(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_http_backends_hold_a_credential() {
        let canned = AdvisorConfig {
            backend: BackendType::Canned,
            ..AdvisorConfig::default()
        };
        let backend = create_backend(&canned, None);
        assert!(backend.as_ref().is_some_and(|b| !b.holds_credential()));

        let http = create_backend(&AdvisorConfig::default(), Some("sk-test".to_owned()));
        assert!(http.as_ref().is_some_and(LlmBackend::holds_credential));
        assert!(create_backend(&AdvisorConfig::default(), None).is_none());
    }

    #[test]
    fn extract_openai_content_valid() {
        let json = serde_json::json!({
            "choices": [{
                "message": {
                    "content": "1. Condition assessment: thriving"
                }
            }]
        });
        let result = extract_openai_content(&json);
        assert!(result.is_ok());
        assert!(result.unwrap_or_default().contains("thriving"));
    }

    #[test]
    fn extract_openai_content_missing_choices() {
        let json = serde_json::json!({"error": "rate_limit"});
        let result = extract_openai_content(&json);
        assert!(matches!(result, Err(AdvisorError::Malformed(_))));
    }

    #[test]
    fn extract_anthropic_content_valid() {
        let json = serde_json::json!({
            "content": [{
                "type": "text",
                "text": "OK"
            }]
        });
        let result = extract_anthropic_content(&json);
        assert_eq!(result.ok().as_deref(), Some("OK"));
    }

    #[test]
    fn extract_anthropic_content_missing() {
        let json = serde_json::json!({"content": []});
        let result = extract_anthropic_content(&json);
        assert!(result.is_err());
    }

    #[test]
    fn create_backend_needs_a_credential_for_http() {
        let config = AdvisorConfig::default();
        assert!(create_backend(&config, None).is_none());

        let backend = create_backend(&config, Some("key".to_owned()));
        assert_eq!(backend.as_ref().map(LlmBackend::name), Some("openai-compatible"));

        let anthropic = AdvisorConfig {
            backend: BackendType::Anthropic,
            ..AdvisorConfig::default()
        };
        let backend = create_backend(&anthropic, Some("key".to_owned()));
        assert_eq!(backend.as_ref().map(LlmBackend::name), Some("anthropic"));
    }

    #[test]
    fn canned_backend_needs_no_credential() {
        let config = AdvisorConfig {
            backend: BackendType::Canned,
            canned_reply: Some("OK".to_owned()),
            ..AdvisorConfig::default()
        };
        let backend = create_backend(&config, None);
        assert_eq!(backend.as_ref().map(LlmBackend::name), Some("canned"));
    }

    #[tokio::test]
    async fn canned_backend_replays_reply() {
        let backend = LlmBackend::Canned(CannedBackend::replying("OK"));
        let prompt = RenderedPrompt {
            system: String::new(),
            user: String::new(),
            max_tokens: 10,
            temperature: 0.1,
        };
        assert_eq!(backend.complete(&prompt).await.ok().as_deref(), Some("OK"));

        let failing = LlmBackend::Canned(CannedBackend::failing(AdvisorError::Transport(
            "down".to_owned(),
        )));
        assert!(failing.complete(&prompt).await.is_err());
    }

    #[tokio::test]
    async fn scripted_backend_runs_script_then_repeats() {
        let backend = LlmBackend::Canned(CannedBackend::scripted(
            vec![CannedReply::text("first"), CannedReply::error(AdvisorError::Timeout(1))],
            CannedReply::text("again"),
        ));
        let prompt = RenderedPrompt {
            system: String::new(),
            user: String::new(),
            max_tokens: 10,
            temperature: 0.1,
        };
        assert_eq!(backend.complete(&prompt).await.ok().as_deref(), Some("first"));
        assert!(backend.complete(&prompt).await.is_err());
        assert_eq!(backend.complete(&prompt).await.ok().as_deref(), Some("again"));
        assert_eq!(backend.complete(&prompt).await.ok().as_deref(), Some("again"));
    }
}
