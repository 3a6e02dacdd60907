//! The answer-generation boundary consumed by the orchestrator

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{FinishReason, LlmProvider, LlmRequest};
use crate::domain::DomainError;

/// Prompt handed to a generation backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisPrompt {
    pub system: String,
    pub user: String,
}

impl SynthesisPrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Opaque `generate(prompt) -> text` capability
#[async_trait]
pub trait AnswerGenerator: Send + Sync + Debug {
    async fn generate(&self, prompt: &SynthesisPrompt) -> Result<String, DomainError>;

    /// Registry name of the backend, used in logs and responses
    fn backend_name(&self) -> &str;
}

/// Sampling parameters sent with every generation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_tokens() -> u32 {
    512
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Adapts an `LlmProvider` and a model name into an `AnswerGenerator`
#[derive(Debug, Clone)]
pub struct ProviderGenerator {
    name: String,
    provider: Arc<dyn LlmProvider>,
    model: String,
    params: GenerationParams,
}

impl ProviderGenerator {
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            model: model.into(),
            params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl AnswerGenerator for ProviderGenerator {
    async fn generate(&self, prompt: &SynthesisPrompt) -> Result<String, DomainError> {
        let request = LlmRequest::builder()
            .system(prompt.system.clone())
            .user(prompt.user.clone())
            .temperature(self.params.temperature)
            .top_p(self.params.top_p)
            .max_tokens(self.params.max_tokens)
            .build();

        let response = self.provider.chat(&self.model, request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                backend = %self.name,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Generation finished"
            );
        }
        if response.finish_reason == Some(FinishReason::Length) {
            warn!(
                backend = %self.name,
                max_tokens = self.params.max_tokens,
                "Answer truncated at token limit"
            );
        }

        Ok(response.content().trim().to_string())
    }

    fn backend_name(&self) -> &str {
        &self.name
    }
}
