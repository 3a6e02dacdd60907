use std::sync::Arc;
use std::time::Duration;

use super::http_client::HttpClient;
use super::ollama::{OllamaProvider, DEFAULT_OLLAMA_BASE_URL};
use super::openai::{OpenAiProvider, DEFAULT_OPENAI_BASE_URL};
use crate::domain::llm::{
    AnswerGenerator, BackendKind, BackendSpec, GenerationParams, GeneratorFactory, LlmProvider,
    ProviderGenerator,
};
use crate::domain::DomainError;

/// Environment variable read for remote backends that do not name their own
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Builds HTTP-backed generators from registry entries, dispatching on `BackendKind`
#[derive(Debug, Clone)]
pub struct HttpGeneratorFactory {
    params: GenerationParams,
    request_timeout: Duration,
}

impl HttpGeneratorFactory {
    pub fn new(params: GenerationParams, request_timeout: Duration) -> Self {
        Self {
            params,
            request_timeout,
        }
    }

    fn provider(&self, spec: &BackendSpec) -> Result<Arc<dyn LlmProvider>, DomainError> {
        let client = HttpClient::with_timeout(self.request_timeout)?;

        match spec.kind {
            BackendKind::Local => {
                let base_url = spec.base_url.as_deref().unwrap_or(DEFAULT_OLLAMA_BASE_URL);
                Ok(Arc::new(OllamaProvider::with_base_url(client, base_url)))
            }
            BackendKind::Remote => {
                let var = spec.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);
                let api_key = std::env::var(var).map_err(|_| {
                    DomainError::configuration(format!(
                        "Backend '{}' requires the {} environment variable",
                        spec.name, var
                    ))
                })?;
                let base_url = spec.base_url.as_deref().unwrap_or(DEFAULT_OPENAI_BASE_URL);
                Ok(Arc::new(OpenAiProvider::with_base_url(client, api_key, base_url)))
            }
        }
    }
}

impl GeneratorFactory for HttpGeneratorFactory {
    fn create(&self, spec: &BackendSpec) -> Result<Arc<dyn AnswerGenerator>, DomainError> {
        let provider = self.provider(spec)?;
        Ok(Arc::new(
            ProviderGenerator::new(spec.name.clone(), provider, spec.model.clone())
                .with_params(self.params),
        ))
    }
}
