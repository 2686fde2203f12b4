//! Chat transcript entries and relay parameter types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in a conversation transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Set on assistant entries that report a relay failure.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            is_error: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            is_error: false,
        }
    }

    /// Assistant entry carrying a relay error, rendered distinctly by clients.
    pub fn error(message: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: format!("Erreur: {message}"),
            timestamp: Utc::now(),
            is_error: true,
        }
    }
}

/// Generation parameters sent along with a message.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatParams {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl ChatParams {
    pub const DEFAULT_TEMPERATURE: f64 = 1.0;
    pub const DEFAULT_MAX_TOKENS: u32 = 1024;
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }
}

/// Inclusive numeric range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamRange<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> ParamRange<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: T) -> T {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Ranges the provider accepts. Values outside are clamped by the relay.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLimits {
    pub temperature: ParamRange<f64>,
    pub max_tokens: ParamRange<u32>,
}

impl ApiLimits {
    pub const PROVIDER: Self = Self {
        temperature: ParamRange::new(0.0, 1.0),
        max_tokens: ParamRange::new(1, 4096),
    };
}

impl Default for ApiLimits {
    fn default() -> Self {
        Self::PROVIDER
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// What the relay did to the requested parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClampMeta {
    pub requested_temperature: Option<f64>,
    pub used_temperature: f64,
    pub requested_max_tokens: Option<i64>,
    pub used_max_tokens: u32,
    pub adjusted: bool,
}

/// Completion returned by the relay for one message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayReply {
    pub text: String,
    pub model: String,
    pub stop_reason: Option<String>,
    pub usage: TokenUsage,
    pub meta: ClampMeta,
}
