//! Explicit model registry: backend selection is a table lookup by name

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::AnswerGenerator;
use crate::domain::DomainError;

/// Backend family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Locally hosted model server (Ollama)
    Local,
    /// Hosted OpenAI-compatible API
    Remote,
}

/// A selectable backend entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSpec {
    pub name: String,
    pub kind: BackendKind,
    /// Model identifier sent to the backend
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Environment variable holding the API key (remote backends)
    #[serde(default, skip_serializing)]
    pub api_key_env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BackendSpec {
    pub fn new(name: impl Into<String>, kind: BackendKind, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            model: model.into(),
            base_url: None,
            api_key_env: None,
            description: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = Some(var.into());
        self
    }
}

/// Ordered, name-unique set of backend entries
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    backends: Vec<BackendSpec>,
}

impl ModelRegistry {
    pub fn new(backends: Vec<BackendSpec>) -> Result<Self, DomainError> {
        if backends.is_empty() {
            return Err(DomainError::configuration(
                "Model registry must contain at least one backend",
            ));
        }

        let mut seen = HashSet::new();
        for spec in &backends {
            if spec.name.trim().is_empty() || spec.model.trim().is_empty() {
                return Err(DomainError::configuration(
                    "Backend entries need a name and a model",
                ));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(DomainError::configuration(format!(
                    "Duplicate backend name '{}'",
                    spec.name
                )));
            }
        }

        Ok(Self { backends })
    }

    pub fn get(&self, name: &str) -> Result<&BackendSpec, DomainError> {
        self.backends
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| DomainError::not_found(format!("Unknown model '{}'", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.backends.iter().any(|b| b.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackendSpec> {
        self.backends.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name.as_str()).collect()
    }
}

/// Builds a generator for a registry entry
pub trait GeneratorFactory: Send + Sync + Debug {
    fn create(&self, spec: &BackendSpec) -> Result<Arc<dyn AnswerGenerator>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModelRegistry {
        ModelRegistry::new(vec![
            BackendSpec::new("llama3.2", BackendKind::Local, "llama3.2:3b"),
            BackendSpec::new("gpt-4o-mini", BackendKind::Remote, "gpt-4o-mini")
                .with_api_key_env("OPENAI_API_KEY"),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup_is_exact() {
        let registry = registry();
        assert_eq!(registry.get("llama3.2").unwrap().kind, BackendKind::Local);
        assert!(registry.get("llama").is_err());
        assert!(!registry.contains("gpt-4o"));
        assert_eq!(registry.names(), vec!["llama3.2", "gpt-4o-mini"]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = ModelRegistry::new(vec![
            BackendSpec::new("a", BackendKind::Local, "m"),
            BackendSpec::new("a", BackendKind::Remote, "m"),
        ]);
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_empty_registry_rejected() {
        assert!(ModelRegistry::new(vec![]).is_err());
    }

    #[test]
    fn test_api_key_env_not_serialized() {
        let json = serde_json::to_string(&registry().get("gpt-4o-mini").unwrap()).unwrap();
        assert!(!json.contains("OPENAI_API_KEY"));
        assert!(json.contains("\"kind\":\"remote\""));
    }
}
