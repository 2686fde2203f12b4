//! Generation settings with a locked (restricted) and an unlocked mode.

use std::fmt;
use std::str::FromStr;

use plume_core::{ChatParams, ParamRange};

use crate::errors::SessionError;

pub const LOCKED_TEMPERATURE: ParamRange<f64> = ParamRange::new(0.5, 0.8);
pub const LOCKED_MAX_TOKENS: ParamRange<u32> = ParamRange::new(512, 1280);
pub const UNLOCKED_TEMPERATURE: ParamRange<f64> = ParamRange::new(0.0, 2.0);
pub const UNLOCKED_MAX_TOKENS: ParamRange<u32> = ParamRange::new(256, 4096);

/// One-step parameter sets, offered only in unlocked mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    Precis,
    Equilibre,
    Creatif,
    Long,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Self::Precis, Self::Equilibre, Self::Creatif, Self::Long];

    pub fn label(self) -> &'static str {
        match self {
            Self::Precis => "Précis",
            Self::Equilibre => "Équilibré",
            Self::Creatif => "Créatif",
            Self::Long => "Long",
        }
    }

    pub fn params(self) -> ChatParams {
        let (temperature, max_tokens) = match self {
            Self::Precis => (0.3, 1024),
            Self::Equilibre => (1.0, 2048),
            Self::Creatif => (1.5, 3072),
            Self::Long => (0.7, 4096),
        };
        ChatParams {
            temperature,
            max_tokens,
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Preset {
    type Err = String;

    /// Case-insensitive; accents are optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "précis" | "precis" => Ok(Self::Precis),
            "équilibré" | "equilibre" => Ok(Self::Equilibre),
            "créatif" | "creatif" => Ok(Self::Creatif),
            "long" => Ok(Self::Long),
            other => Err(format!("preset inconnu : {other}")),
        }
    }
}

/// Slider bounds depend on the mode. Values above what the provider accepts
/// are left to the relay to clamp.
#[derive(Clone, Debug, PartialEq)]
pub struct SettingsPanel {
    params: ChatParams,
    locked: bool,
}

impl Default for SettingsPanel {
    fn default() -> Self {
        Self::new(ChatParams::default())
    }
}

impl SettingsPanel {
    /// Starts locked with `initial` untouched, even if outside the locked bounds.
    pub fn new(initial: ChatParams) -> Self {
        Self {
            params: initial,
            locked: true,
        }
    }

    pub fn params(&self) -> ChatParams {
        self.params
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn temperature_range(&self) -> ParamRange<f64> {
        if self.locked {
            LOCKED_TEMPERATURE
        } else {
            UNLOCKED_TEMPERATURE
        }
    }

    pub fn max_tokens_range(&self) -> ParamRange<u32> {
        if self.locked {
            LOCKED_MAX_TOKENS
        } else {
            UNLOCKED_MAX_TOKENS
        }
    }

    /// Set the temperature within the current bounds; returns the value kept.
    pub fn set_temperature(&mut self, value: f64) -> f64 {
        let range = self.temperature_range();
        let value = if value.is_finite() {
            range.clamp(value)
        } else {
            range.min
        };
        self.params.temperature = value;
        value
    }

    /// Set the token limit within the current bounds; returns the value kept.
    pub fn set_max_tokens(&mut self, value: i64) -> u32 {
        let range = self.max_tokens_range();
        let value = value.clamp(i64::from(range.min), i64::from(range.max)) as u32;
        self.params.max_tokens = value;
        value
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Replace both values with a preset. Refused while locked.
    pub fn apply_preset(&mut self, preset: Preset) -> Result<ChatParams, SessionError> {
        if self.locked {
            return Err(SessionError::PanelLocked);
        }
        self.params = preset.params();
        Ok(self.params)
    }

    /// Lock and reset to the defaults.
    pub fn lock(&mut self) {
        self.locked = true;
        self.params = ChatParams::default();
    }
}
