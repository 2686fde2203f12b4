use std::time::Duration;

/// Failures talking to the LLM provider, classified by how the relay
/// reports them to the browser.
#[derive(Clone, Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("rate limited")]
    RateLimited,
    #[error("server error {status}: {body}")]
    ServerError { status: u16, body: String },
    #[error("provider overloaded")]
    ProviderOverloaded,
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    #[error("no API key configured")]
    MissingApiKey,
}

impl GatewayError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::InvalidRequest(_) => "invalid_request",
            Self::RateLimited => "rate_limited",
            Self::ServerError { .. } => "server_error",
            Self::ProviderOverloaded => "provider_overloaded",
            Self::NetworkError(_) => "network_error",
            Self::Timeout(_) => "timeout",
            Self::MissingApiKey => "missing_api_key",
        }
    }

    /// Classify an HTTP status code into the appropriate error variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed(body),
            400 => Self::InvalidRequest(body),
            429 => Self::RateLimited,
            529 => Self::ProviderOverloaded,
            500..=599 => Self::ServerError { status, body },
            _ => Self::InvalidRequest(format!("unexpected status {status}: {body}")),
        }
    }

    /// Status code the relay answers with for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::AuthenticationFailed(_) | Self::MissingApiKey => 401,
            Self::InvalidRequest(_) => 400,
            Self::RateLimited => 429,
            Self::ServerError { .. } | Self::ProviderOverloaded => 500,
            Self::NetworkError(_) => 502,
            Self::Timeout(_) => 504,
        }
    }

    /// User-facing (French) message shown inline in the conversation.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthenticationFailed(_) | Self::MissingApiKey => {
                "API Key invalide. Vérifiez votre configuration.".into()
            }
            Self::RateLimited => "Limite de requêtes atteinte. Réessayez plus tard.".into(),
            Self::InvalidRequest(detail) => {
                let detail = if detail.trim().is_empty() {
                    "Vérifiez vos paramètres"
                } else {
                    detail.as_str()
                };
                format!("Paramètres invalides : {detail}")
            }
            Self::ServerError { .. } | Self::ProviderOverloaded => {
                "Erreur du serveur Anthropic. Réessayez plus tard.".into()
            }
            Self::NetworkError(_) | Self::Timeout(_) => self.to_string(),
        }
    }
}
