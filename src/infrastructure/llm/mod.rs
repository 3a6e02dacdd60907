//! Generation backends

mod factory;
mod http_client;
mod ollama;
mod openai;

pub use factory::{HttpGeneratorFactory, DEFAULT_API_KEY_ENV};
pub use http_client::{HttpClient, HttpClientTrait};
pub use ollama::{OllamaProvider, DEFAULT_OLLAMA_BASE_URL};
pub use openai::{OpenAiProvider, DEFAULT_OPENAI_BASE_URL};
