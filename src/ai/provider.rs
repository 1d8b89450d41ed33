//! HTTP text-generation provider
//!
//! Implements `TextGenerator` against any OpenAI-compatible
//! `/v1/chat/completions` endpoint (Ollama, OpenAI, LiteLLM, vLLM, …).
//!
//! Configuration via environment variables:
//! - `PORTAL_AI_URL` (default: `http://localhost:11434/v1/chat/completions`)
//! - `PORTAL_AI_API_KEY` (optional, for hosted providers)
//! - `PORTAL_AI_TIMEOUT_SECS` (default: `30`)

use super::traits::TextGenerator;
use crate::error::PortalError;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// HTTP-based text generator using the OpenAI chat completions format.
///
/// Thread-safe and cheaply cloneable (shares the reqwest client).
#[derive(Clone)]
pub struct HttpTextGenerator {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

/// OpenAI-compatible chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// OpenAI-compatible error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl HttpTextGenerator {
    /// Create a new provider with explicit configuration.
    ///
    /// # Arguments
    ///
    /// * `url` - The chat completions endpoint
    /// * `api_key` - Optional bearer token for authenticated endpoints
    /// * `timeout_secs` - Hard request timeout; no AI call may block the
    ///   surrounding deterministic path longer than this
    pub fn new(url: String, api_key: Option<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            url,
            api_key,
        }
    }

    /// Create a provider from environment variables.
    ///
    /// Returns `None` if `PORTAL_AI_URL` is explicitly set to empty or
    /// "disabled" — consumers then run deterministic-only.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("PORTAL_AI_URL")
            .unwrap_or_else(|_| "http://localhost:11434/v1/chat/completions".to_string());

        if url.is_empty() || url.eq_ignore_ascii_case("disabled") {
            return None;
        }

        let api_key = std::env::var("PORTAL_AI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        let timeout_secs: u64 = std::env::var("PORTAL_AI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Some(Self::new(url, api_key, timeout_secs))
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String> {
        let request_body = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let mut req = self.client.post(&self.url).json(&request_body);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let response = req.send().await.map_err(|e| {
            PortalError::ExternalServiceUnavailable(format!(
                "failed to reach text API at {}: {}",
                self.url, e
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to surface the OpenAI-style error message
            if let Ok(err) = serde_json::from_str::<ErrorResponse>(&body) {
                if let Some(detail) = err.error {
                    return Err(PortalError::ExternalServiceUnavailable(format!(
                        "text API error ({}): {}",
                        status.as_u16(),
                        detail.message
                    ))
                    .into());
                }
            }
            return Err(PortalError::ExternalServiceUnavailable(format!(
                "text API returned {} — {}",
                status.as_u16(),
                body
            ))
            .into());
        }

        let resp: ChatResponse = response.json().await.map_err(|e| {
            PortalError::ExternalServiceUnavailable(format!(
                "failed to parse text API response: {}",
                e
            ))
        })?;

        resp.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                PortalError::ExternalServiceUnavailable(
                    "text API returned no choices".to_string(),
                )
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "office supplies" } }
                ]
            })))
            .mount(&server)
            .await;

        let provider = HttpTextGenerator::new(
            format!("{}/v1/chat/completions", server.uri()),
            None,
            5,
        );
        let text = provider.generate("categorize this", "test-model").await.unwrap();
        assert_eq!(text, "office supplies");
    }

    #[tokio::test]
    async fn test_api_key_sent_as_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer key-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [ { "message": { "role": "assistant", "content": "ok" } } ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpTextGenerator::new(
            format!("{}/v1/chat/completions", server.uri()),
            Some("key-123".to_string()),
            5,
        );
        provider.generate("hello", "test-model").await.unwrap();
    }

    #[tokio::test]
    async fn test_error_status_maps_to_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "invalid api key" }
            })))
            .mount(&server)
            .await;

        let provider = HttpTextGenerator::new(
            format!("{}/v1/chat/completions", server.uri()),
            None,
            5,
        );
        let err = provider.generate("hello", "test-model").await.unwrap_err();
        let portal = err.downcast_ref::<crate::error::PortalError>().unwrap();
        assert!(matches!(
            portal,
            crate::error::PortalError::ExternalServiceUnavailable(_)
        ));
        assert!(portal.to_string().contains("invalid api key"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let provider = HttpTextGenerator::new(
            format!("{}/v1/chat/completions", server.uri()),
            None,
            5,
        );
        assert!(provider.generate("hello", "test-model").await.is_err());
    }

    /// Combined env-config test to avoid parallel env var races.
    #[test]
    fn test_from_env_lifecycle() {
        let _env = crate::test_helpers::ENV_LOCK.lock().unwrap();

        fn clear_env() {
            std::env::remove_var("PORTAL_AI_URL");
            std::env::remove_var("PORTAL_AI_API_KEY");
            std::env::remove_var("PORTAL_AI_TIMEOUT_SECS");
        }

        // --- Phase 1: Defaults ---
        clear_env();
        let provider = HttpTextGenerator::from_env().unwrap();
        assert_eq!(provider.url, "http://localhost:11434/v1/chat/completions");
        assert!(provider.api_key.is_none());

        // --- Phase 2: Custom values ---
        std::env::set_var("PORTAL_AI_URL", "https://api.openai.com/v1/chat/completions");
        std::env::set_var("PORTAL_AI_API_KEY", "sk-test");
        let provider = HttpTextGenerator::from_env().unwrap();
        assert_eq!(provider.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(provider.api_key, Some("sk-test".to_string()));

        // --- Phase 3: Disabled ---
        std::env::set_var("PORTAL_AI_URL", "disabled");
        assert!(HttpTextGenerator::from_env().is_none());
        std::env::set_var("PORTAL_AI_URL", "");
        assert!(HttpTextGenerator::from_env().is_none());

        clear_env();
    }
}
