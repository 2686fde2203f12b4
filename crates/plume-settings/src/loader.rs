//! Settings loading with deep merge and environment variable overrides.
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::PlumeSettings;

/// Upper bound for the auto-confirm delay, from the file or `PLUME_AUTO_CONFIRM_MS`.
pub const MAX_AUTO_CONFIRM_DELAY_MS: u64 = 60_000;

/// Resolve the path to the settings file (`~/.plume/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".plume").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<PlumeSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<PlumeSettings> {
    let mut settings = read_layered(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

fn read_layered(path: &Path) -> Result<PlumeSettings> {
    let defaults = serde_json::to_value(PlumeSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let settings: PlumeSettings = serde_json::from_value(merged)?;
    validate(&settings)?;
    Ok(settings)
}

/// Reject values that type-check but cannot be used.
pub fn validate(settings: &PlumeSettings) -> Result<()> {
    let spell = &settings.spellcheck;
    if !is_language_code(&spell.language) {
        return Err(SettingsError::Invalid {
            key: "spellcheck.language",
            reason: format!("expected a two-letter code, got {:?}", spell.language),
        });
    }
    if spell.max_remote_matches == 0 {
        return Err(SettingsError::Invalid {
            key: "spellcheck.maxRemoteMatches",
            reason: "must be at least 1".into(),
        });
    }
    if spell.auto_confirm_delay_ms > MAX_AUTO_CONFIRM_DELAY_MS {
        return Err(SettingsError::Invalid {
            key: "spellcheck.autoConfirmDelayMs",
            reason: format!(
                "{} exceeds {MAX_AUTO_CONFIRM_DELAY_MS}",
                spell.auto_confirm_delay_ms
            ),
        });
    }
    if settings.server.port == 0 {
        return Err(SettingsError::Invalid {
            key: "server.port",
            reason: "must be between 1 and 65535".into(),
        });
    }
    Ok(())
}

fn is_language_code(v: &str) -> bool {
    v.len() == 2 && v.chars().all(|c| c.is_ascii_alphabetic())
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut PlumeSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Invalid values are logged and ignored (falling back to file/default).
pub fn apply_overrides(settings: &mut PlumeSettings, lookup: impl Fn(&str) -> Option<String>) {
    let env = EnvReader { lookup };

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = env.u16("PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = env.string("PLUME_HOST") {
        settings.server.host = v;
    }

    // ── Relay ───────────────────────────────────────────────────────
    if let Some(v) = env.string("PLUME_MODEL") {
        settings.relay.model = v;
    }

    // ── Spellcheck ──────────────────────────────────────────────────
    if let Some(v) = env.string("PLUME_LANGUAGETOOL_URL") {
        settings.spellcheck.remote_url = v;
    }
    if let Some(v) = env.string("PLUME_SPELLCHECK_LANGUAGE") {
        if is_language_code(&v) {
            settings.spellcheck.language = v.to_ascii_lowercase();
        } else {
            tracing::warn!(key = "PLUME_SPELLCHECK_LANGUAGE", value = %v, "expected a two-letter language code, ignoring");
        }
    }
    if let Some(v) = env.bool("PLUME_REMOTE_CHECK") {
        settings.spellcheck.remote_enabled = v;
    }
    if let Some(v) = env.bool("PLUME_AUTO_CONFIRM") {
        settings.spellcheck.auto_confirm = v;
    }
    if let Some(v) = env.u64("PLUME_AUTO_CONFIRM_MS", 0, MAX_AUTO_CONFIRM_DELAY_MS) {
        settings.spellcheck.auto_confirm_delay_ms = v;
    }

    // ── Session ─────────────────────────────────────────────────────
    if let Some(v) = env.string("PLUME_SERVER_URL") {
        settings.session.server_url = v;
    }
}

/// The provider API key from `ANTHROPIC_API_KEY`, if set and non-empty.
pub fn anthropic_api_key() -> Option<SecretString> {
    std::env::var("ANTHROPIC_API_KEY")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers ─────────────────────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = (self.lookup)(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u16(&self, name: &str, min: u16, max: u16) -> Option<u16> {
        let val = (self.lookup)(name)?;
        let result = parse_u16_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = (self.lookup)(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
