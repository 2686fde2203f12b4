//! # plume-session
//!
//! One user's conversation: the transcript, the settings panel, and the
//! gate-then-relay flow every message goes through.

pub mod errors;
pub mod format;
pub mod panel;
pub mod relay;
pub mod session;

pub use errors::SessionError;
pub use format::format_french_punctuation;
pub use panel::{Preset, SettingsPanel};
pub use relay::{HttpRelayClient, Relay, RelayFailure};
pub use session::ChatSession;
