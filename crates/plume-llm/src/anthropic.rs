use std::time::Duration;

use async_trait::async_trait;
use plume_core::{GatewayError, TokenUsage};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use crate::provider::{Completion, CompletionProvider, CompletionRequest};

pub const API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone, Debug)]
pub struct AnthropicConfig {
    pub api_url: String,
    pub model: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_url: API_URL.into(),
            model: DEFAULT_MODEL.into(),
            api_version: API_VERSION.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Anthropic Messages API, non-streaming.
pub struct AnthropicProvider {
    client: Client,
    api_key: Option<SecretString>,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    /// A missing key is accepted here and reported on each call as
    /// [`GatewayError::MissingApiKey`].
    pub fn new(config: AnthropicConfig, api_key: Option<SecretString>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            config,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": [{ "role": "user", "content": request.message }],
        })
    }

    fn classify(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.config.timeout)
        } else {
            GatewayError::NetworkError(e.to_string())
        }
    }
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("model", &self.config.model)
            .field("api_url", &self.config.api_url)
            .field("has_api_key", &self.has_api_key())
            .finish()
    }
}

// ── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    model: String,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl MessagesResponse {
    fn into_completion(self) -> Completion {
        let text = self
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");
        Completion {
            text,
            model: self.model,
            stop_reason: self.stop_reason,
            usage: TokenUsage {
                input_tokens: self.usage.input_tokens,
                output_tokens: self.usage.output_tokens,
            },
        }
    }
}

/// The provider's `error.message` when the body carries one, else the body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_owned))
        .unwrap_or_else(|| body.to_owned())
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip(self, request), fields(model = %self.config.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, GatewayError> {
        let api_key = self.api_key.as_ref().ok_or(GatewayError::MissingApiKey)?;

        let resp = self
            .client
            .post(&self.config.api_url)
            .timeout(self.config.timeout)
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", &self.config.api_version)
            .header("content-type", "application/json")
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(status, error_detail(&body)));
        }

        let parsed: MessagesResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(self.config.timeout)
            } else {
                GatewayError::NetworkError(format!("malformed response: {e}"))
            }
        })?;
        Ok(parsed.into_completion())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider_for(server: &MockServer, key: Option<&str>) -> AnthropicProvider {
        AnthropicProvider::new(
            AnthropicConfig {
                api_url: format!("{}/v1/messages", server.uri()),
                timeout: Duration::from_secs(2),
                ..Default::default()
            },
            key.map(|k| SecretString::from(k.to_string())),
        )
    }

    fn request(message: &str) -> CompletionRequest {
        CompletionRequest {
            message: message.into(),
            temperature: 0.7,
            max_tokens: 512,
        }
    }

    #[tokio::test]
    async fn sends_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", API_VERSION))
            .and(body_partial_json(serde_json::json!({
                "model": DEFAULT_MODEL,
                "max_tokens": 512,
                "temperature": 0.7,
                "messages": [{ "role": "user", "content": "Bonjour" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_1",
                "model": DEFAULT_MODEL,
                "content": [
                    { "type": "text", "text": "Bonjour ! " },
                    { "type": "text", "text": "Comment puis-je aider ?" }
                ],
                "stop_reason": "end_turn",
                "usage": { "input_tokens": 9, "output_tokens": 12 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = provider_for(&server, Some("sk-test"))
            .complete(&request("Bonjour"))
            .await
            .unwrap();
        assert_eq!(completion.text, "Bonjour ! Comment puis-je aider ?");
        assert_eq!(completion.stop_reason.as_deref(), Some("end_turn"));
        assert_eq!(completion.usage.output_tokens, 12);
    }

    #[tokio::test]
    async fn missing_key_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = provider_for(&server, None);
        assert!(!provider.has_api_key());
        assert!(matches!(
            provider.complete(&request("Bonjour")).await,
            Err(GatewayError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn status_errors_are_classified() {
        let cases = [
            (401, "authentication_failed"),
            (429, "rate_limited"),
            (400, "invalid_request"),
            (500, "server_error"),
            (529, "provider_overloaded"),
        ];
        for (status, kind) in cases {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
                    "type": "error",
                    "error": { "type": "x", "message": "max_tokens: too large" }
                })))
                .mount(&server)
                .await;

            let err = provider_for(&server, Some("sk"))
                .complete(&request("Bonjour"))
                .await
                .unwrap_err();
            assert_eq!(err.error_kind(), kind, "status {status}");
        }
    }

    #[tokio::test]
    async fn bad_request_carries_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "message": "temperature: must be <= 1" }
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server, Some("sk"))
            .complete(&request("Bonjour"))
            .await
            .unwrap_err();
        assert_eq!(
            err.user_message(),
            "Paramètres invalides : temperature: must be <= 1"
        );
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new(
            AnthropicConfig {
                api_url: server.uri(),
                timeout: Duration::from_millis(100),
                ..Default::default()
            },
            Some(SecretString::from("sk".to_string())),
        );
        assert!(matches!(
            provider.complete(&request("Bonjour")).await,
            Err(GatewayError::Timeout(_))
        ));
    }

    #[test]
    fn error_detail_falls_back_to_body() {
        assert_eq!(error_detail(r#"{"error":{"message":"nope"}}"#), "nope");
        assert_eq!(error_detail("plain text"), "plain text");
    }

    #[test]
    fn debug_hides_key() {
        let provider = AnthropicProvider::new(
            AnthropicConfig::default(),
            Some(SecretString::from("sk-secret".to_string())),
        );
        let dbg = format!("{provider:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("has_api_key: true"));
    }
}
