//! Typed settings with compiled defaults.
//!
//! Every struct is `#[serde(default)]` so a partial settings file only needs
//! the keys it changes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlumeSettings {
    pub server: ServerSettings,
    pub relay: RelaySettings,
    pub spellcheck: SpellcheckSettings,
    pub session: SessionSettings,
}

/// HTTP listener for the relay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3001,
            request_timeout_secs: 120,
        }
    }
}

/// Upstream LLM provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelaySettings {
    pub api_url: String,
    pub model: String,
    pub api_version: String,
    pub default_temperature: f64,
    pub default_max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.anthropic.com/v1/messages".into(),
            model: "claude-sonnet-4-20250514".into(),
            api_version: "2023-06-01".into(),
            default_temperature: 1.0,
            default_max_tokens: 1024,
            timeout_secs: 120,
        }
    }
}

impl RelaySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Spell-check gate and remote grammar service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpellcheckSettings {
    pub remote_enabled: bool,
    pub remote_url: String,
    /// Two-letter language code sent to the grammar service.
    pub language: String,
    pub remote_timeout_secs: u64,
    pub max_remote_matches: usize,
    /// Whether a clear result confirms itself after `auto_confirm_delay_ms`.
    pub auto_confirm: bool,
    pub auto_confirm_delay_ms: u64,
}

impl Default for SpellcheckSettings {
    fn default() -> Self {
        Self {
            remote_enabled: true,
            remote_url: "https://api.languagetool.org/v2/check".into(),
            language: "fr".into(),
            remote_timeout_secs: 10,
            max_remote_matches: 10,
            auto_confirm: true,
            auto_confirm_delay_ms: 500,
        }
    }
}

impl SpellcheckSettings {
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }

    pub fn auto_confirm_delay(&self) -> Option<Duration> {
        self.auto_confirm
            .then(|| Duration::from_millis(self.auto_confirm_delay_ms))
    }
}

/// Terminal chat client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Base URL of the relay server.
    pub server_url: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:3001".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = PlumeSettings::default();
        assert_eq!(settings.server.port, 3001);
        assert_eq!(settings.relay.model, "claude-sonnet-4-20250514");
        assert_eq!(settings.relay.default_max_tokens, 1024);
        assert_eq!(settings.spellcheck.language, "fr");
        assert_eq!(settings.spellcheck.max_remote_matches, 10);
        assert_eq!(
            settings.spellcheck.auto_confirm_delay(),
            Some(Duration::from_millis(500))
        );
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(PlumeSettings::default()).unwrap();
        assert_eq!(json["server"]["requestTimeoutSecs"], 120);
        assert_eq!(json["spellcheck"]["autoConfirmDelayMs"], 500);
        assert_eq!(json["session"]["serverUrl"], "http://127.0.0.1:3001");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: PlumeSettings =
            serde_json::from_str(r#"{"spellcheck": {"language": "en"}}"#).unwrap();
        assert_eq!(settings.spellcheck.language, "en");
        assert!(settings.spellcheck.remote_enabled);
        assert_eq!(settings.server.port, 3001);
    }

    #[test]
    fn auto_confirm_can_be_disabled() {
        let settings: SpellcheckSettings =
            serde_json::from_str(r#"{"autoConfirm": false}"#).unwrap();
        assert_eq!(settings.auto_confirm_delay(), None);
    }
}
