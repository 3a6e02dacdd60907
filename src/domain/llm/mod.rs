//! Generation backend models and traits

mod generator;
mod message;
mod provider;
mod registry;
mod request;
mod response;

pub use generator::{AnswerGenerator, GenerationParams, ProviderGenerator, SynthesisPrompt};
pub use message::{Message, MessageRole};
pub use provider::LlmProvider;
pub use registry::{BackendKind, BackendSpec, GeneratorFactory, ModelRegistry};
pub use request::{LlmRequest, LlmRequestBuilder};
pub use response::{FinishReason, LlmResponse, Usage};

#[cfg(test)]
pub use provider::mock::MockLlmProvider;
