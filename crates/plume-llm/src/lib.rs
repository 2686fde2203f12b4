//! # plume-llm
//!
//! The relay between chat clients and the LLM provider: parameter clamping,
//! the provider abstraction, the Anthropic Messages API client, and a
//! scripted mock for tests.

pub mod anthropic;
pub mod mock;
pub mod provider;
pub mod relay;

pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use mock::{MockProvider, MockResponse};
pub use provider::{Completion, CompletionProvider, CompletionRequest};
pub use relay::{LimitEntry, LimitsDocument, RelayError, RelayRequest, RelayService};
