use async_trait::async_trait;
use std::fmt::Debug;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Trait for generation backends (Ollama, OpenAI-compatible, ...)
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat request to the given backend model
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
