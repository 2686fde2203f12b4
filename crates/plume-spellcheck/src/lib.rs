//! # plume-spellcheck
//!
//! The mandatory spell-check gate in front of the relay.
//!
//! - [`RuleMatcher`]: fixed table of French homophone heuristics plus
//!   whitespace, punctuation and capitalization hygiene. Pure, no I/O.
//! - [`RemoteGrammarClient`]: optional LanguageTool call, fail-soft.
//! - [`SpellCheckGate`]: runs the checkers in order and holds each candidate
//!   message in `Checking`, `Blocked` or `Clear` until it is confirmed or
//!   cancelled.

pub mod checker;
pub mod errors;
pub mod gate;
pub mod remote;
pub mod rules;

pub use checker::Checker;
pub use errors::CheckError;
pub use gate::{GateCheck, GateOptions, GateState, SpellCheckGate};
pub use remote::{RemoteConfig, RemoteError, RemoteGrammarClient};
pub use rules::{HomophoneRule, RuleMatcher, HOMOPHONE_RULES};
