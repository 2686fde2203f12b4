use async_trait::async_trait;
use plume_core::{GatewayError, TokenUsage};

/// A single-turn completion request, parameters already clamped.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub message: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub stop_reason: Option<String>,
    pub usage: TokenUsage,
}

/// Backend able to answer one user message. One attempt per call, no retries.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, GatewayError>;
}
