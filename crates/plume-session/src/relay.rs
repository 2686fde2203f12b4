//! Where a confirmed message goes: the HTTP relay server or an in-process
//! [`RelayService`].

use async_trait::async_trait;
use plume_core::{ChatParams, RelayReply};
use plume_llm::{RelayRequest, RelayService};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

/// A relay failure, carrying the text shown in the transcript.
#[derive(Debug, thiserror::Error)]
pub enum RelayFailure {
    /// The relay answered with an error status.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// The relay could not be reached.
    #[error("{0}")]
    Unreachable(String),
}

impl RelayFailure {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Unreachable(_) => None,
        }
    }
}

#[async_trait]
pub trait Relay: Send + Sync {
    async fn send(&self, text: &str, params: ChatParams) -> Result<RelayReply, RelayFailure>;
}

#[async_trait]
impl Relay for RelayService {
    async fn send(&self, text: &str, params: ChatParams) -> Result<RelayReply, RelayFailure> {
        self.relay(&RelayRequest::new(text, params))
            .await
            .map_err(|e| RelayFailure::Rejected {
                status: e.http_status(),
                message: e.user_message(),
            })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Client for a running plume server.
#[derive(Clone, Debug)]
pub struct HttpRelayClient {
    client: Client,
    base_url: String,
}

impl HttpRelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// True when `/api/health` answers with a success status.
    pub async fn check_health(&self) -> bool {
        match self.client.get(format!("{}/api/health", self.base_url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!(error = %e, url = %self.base_url, "relay server not reachable");
                false
            }
        }
    }
}

#[async_trait]
impl Relay for HttpRelayClient {
    async fn send(&self, text: &str, params: ChatParams) -> Result<RelayReply, RelayFailure> {
        let resp = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&RelayRequest::new(text, params))
            .send()
            .await
            .map_err(|e| RelayFailure::Unreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.json::<ErrorBody>().await.ok().and_then(|b| b.error);
            let message = body.unwrap_or_else(|| {
                format!(
                    "Erreur HTTP: {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or_default()
                )
                .trim_end()
                .to_string()
            });
            return Err(RelayFailure::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<RelayReply>()
            .await
            .map_err(|e| RelayFailure::Unreachable(format!("réponse invalide: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use plume_core::GatewayError;
    use plume_llm::{MockProvider, MockResponse};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn reply_json(text: &str) -> serde_json::Value {
        serde_json::json!({
            "text": text,
            "model": "claude-sonnet-4-20250514",
            "stopReason": "end_turn",
            "usage": { "inputTokens": 3, "outputTokens": 4 },
            "meta": {
                "requestedTemperature": 0.7,
                "usedTemperature": 0.7,
                "requestedMaxTokens": 512,
                "usedMaxTokens": 512,
                "adjusted": false
            }
        })
    }

    fn params() -> ChatParams {
        ChatParams {
            temperature: 0.7,
            max_tokens: 512,
        }
    }

    #[tokio::test]
    async fn http_send_posts_message_and_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "message": "Bonjour",
                "temperature": 0.7,
                "maxTokens": 512
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_json("Salut !")))
            .expect(1)
            .mount(&server)
            .await;

        let reply = HttpRelayClient::new(format!("{}/", server.uri()))
            .send("Bonjour", params())
            .await
            .unwrap();
        assert_eq!(reply.text, "Salut !");
        assert_eq!(reply.usage.output_tokens, 4);
    }

    #[tokio::test]
    async fn http_error_uses_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": "Limite de requêtes atteinte. Réessayez plus tard."
            })))
            .mount(&server)
            .await;

        let err = HttpRelayClient::new(server.uri())
            .send("Bonjour", params())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.to_string(), "Limite de requêtes atteinte. Réessayez plus tard.");
    }

    #[tokio::test]
    async fn http_error_without_body_falls_back_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = HttpRelayClient::new(server.uri())
            .send("Bonjour", params())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Erreur HTTP: 502 Bad Gateway");
    }

    #[tokio::test]
    async fn health_check_reports_reachability() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "OK" })))
            .mount(&server)
            .await;

        assert!(HttpRelayClient::new(server.uri()).check_health().await);
        assert!(!HttpRelayClient::new("http://127.0.0.1:1").check_health().await);
    }

    #[tokio::test]
    async fn in_process_relay_maps_errors() {
        let provider = Arc::new(MockProvider::new(vec![MockResponse::Error(
            GatewayError::ServerError {
                status: 503,
                body: "unavailable".into(),
            },
        )]));
        let relay = RelayService::new(provider);
        let err = relay.send("Bonjour", params()).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Erreur du serveur Anthropic. Réessayez plus tard.");
    }
}
