//! Parameter clamping and forwarding to the provider.

use std::sync::Arc;

use plume_core::{ApiLimits, ChatParams, ClampMeta, GatewayError, RelayReply};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::provider::{CompletionProvider, CompletionRequest};

const TEMPERATURE_DESCRIPTION: &str = "Contrôle la créativité des réponses (max 1.0 pour Claude API)";
const MAX_TOKENS_DESCRIPTION: &str = "Limite la longueur de la réponse";
const LIMITS_NOTE: &str = "L'API Claude limite la température à 1.0 maximum. Les valeurs supérieures seront automatiquement ajustées.";

/// Number of message characters written to the log.
const LOG_PREVIEW_CHARS: usize = 50;

/// A chat message as sent by a client, parameters unchecked.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<i64>,
}

impl RelayRequest {
    pub fn new(message: impl Into<String>, params: ChatParams) -> Self {
        Self {
            message: message.into(),
            temperature: Some(params.temperature),
            max_tokens: Some(i64::from(params.max_tokens)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Message is required")]
    EmptyMessage,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl RelayError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::EmptyMessage => 400,
            Self::Gateway(e) => e.http_status(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyMessage => self.to_string(),
            Self::Gateway(e) => e.user_message(),
        }
    }
}

/// One range entry of the limits document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LimitEntry<T> {
    pub min: T,
    pub max: T,
    pub default: T,
    pub description: String,
}

/// What `/api/limits` answers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsDocument {
    pub temperature: LimitEntry<f64>,
    pub max_tokens: LimitEntry<u32>,
    pub note: String,
}

/// Clamps parameters into the provider's ranges and forwards one message.
#[derive(Clone)]
pub struct RelayService {
    provider: Arc<dyn CompletionProvider>,
    limits: ApiLimits,
    defaults: ChatParams,
}

impl RelayService {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            limits: ApiLimits::PROVIDER,
            defaults: ChatParams::default(),
        }
    }

    /// Values used when a request omits a parameter. Clamped like requests.
    pub fn with_defaults(mut self, defaults: ChatParams) -> Self {
        self.defaults = ChatParams {
            temperature: self.limits.temperature.clamp(defaults.temperature),
            max_tokens: self.limits.max_tokens.clamp(defaults.max_tokens),
        };
        self
    }

    pub fn provider(&self) -> &Arc<dyn CompletionProvider> {
        &self.provider
    }

    pub fn limits(&self) -> LimitsDocument {
        LimitsDocument {
            temperature: LimitEntry {
                min: self.limits.temperature.min,
                max: self.limits.temperature.max,
                default: self.defaults.temperature,
                description: TEMPERATURE_DESCRIPTION.into(),
            },
            max_tokens: LimitEntry {
                min: self.limits.max_tokens.min,
                max: self.limits.max_tokens.max,
                default: self.defaults.max_tokens,
                description: MAX_TOKENS_DESCRIPTION.into(),
            },
            note: LIMITS_NOTE.into(),
        }
    }

    /// Bring requested parameters into range. Absent or non-finite values
    /// take the defaults.
    pub fn clamp(&self, request: &RelayRequest) -> ClampMeta {
        let requested_temperature = request.temperature.filter(|t| t.is_finite());
        let used_temperature = requested_temperature
            .map_or(self.defaults.temperature, |t| self.limits.temperature.clamp(t));

        let range = self.limits.max_tokens;
        let used_max_tokens = request.max_tokens.map_or(self.defaults.max_tokens, |n| {
            n.clamp(i64::from(range.min), i64::from(range.max)) as u32
        });

        let adjusted = requested_temperature.is_some_and(|t| t != used_temperature)
            || request
                .max_tokens
                .is_some_and(|n| n != i64::from(used_max_tokens));

        ClampMeta {
            requested_temperature,
            used_temperature,
            requested_max_tokens: request.max_tokens,
            used_max_tokens,
            adjusted,
        }
    }

    /// Validate, clamp and forward one message. No retries.
    pub async fn relay(&self, request: &RelayRequest) -> Result<RelayReply, RelayError> {
        if request.message.trim().is_empty() {
            return Err(RelayError::EmptyMessage);
        }

        let meta = self.clamp(request);
        let preview: String = request.message.chars().take(LOG_PREVIEW_CHARS).collect();
        info!(
            message = %preview,
            requested_temperature = ?meta.requested_temperature,
            used_temperature = meta.used_temperature,
            requested_max_tokens = ?meta.requested_max_tokens,
            used_max_tokens = meta.used_max_tokens,
            "relaying message"
        );
        if meta.adjusted {
            warn!(
                requested_temperature = ?meta.requested_temperature,
                used_temperature = meta.used_temperature,
                requested_max_tokens = ?meta.requested_max_tokens,
                used_max_tokens = meta.used_max_tokens,
                "parameters adjusted to provider limits"
            );
        }

        let completion = self
            .provider
            .complete(&CompletionRequest {
                message: request.message.clone(),
                temperature: meta.used_temperature,
                max_tokens: meta.used_max_tokens,
            })
            .await
            .map_err(|e| {
                error!(provider = self.provider.name(), kind = e.error_kind(), error = %e, "provider call failed");
                RelayError::Gateway(e)
            })?;

        Ok(RelayReply {
            text: completion.text,
            model: completion.model,
            stop_reason: completion.stop_reason,
            usage: completion.usage,
            meta,
        })
    }
}

impl std::fmt::Debug for RelayService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayService")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .field("defaults", &self.defaults)
            .finish()
    }
}
