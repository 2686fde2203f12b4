//! # plume-settings
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`PlumeSettings::default()`]
//! 2. **User file**: `~/.plume/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `PORT`, `PLUME_*` overrides (highest priority)
//!
//! The Anthropic API key never lives in the settings file; see
//! [`anthropic_api_key`].

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    anthropic_api_key, apply_env_overrides, apply_overrides, deep_merge, load_settings,
    load_settings_from_path, settings_path, validate, MAX_AUTO_CONFIRM_DELAY_MS,
};
pub use types::*;
