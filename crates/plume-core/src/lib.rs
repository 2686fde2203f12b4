//! # plume-core
//!
//! Shared types for the plume chat playground: spell-check findings,
//! chat transcript entries, relay parameters, and the provider error taxonomy.

pub mod chat;
pub mod errors;
pub mod findings;
pub mod ids;

pub use chat::{ApiLimits, ChatMessage, ChatParams, ClampMeta, ParamRange, RelayReply, Role, TokenUsage};
pub use errors::GatewayError;
pub use findings::{EvaluationResult, Finding, GateDecision, Severity};
pub use ids::{CheckId, SessionId};
