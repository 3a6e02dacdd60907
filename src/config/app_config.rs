use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::classifier::ClassifierConfig;
use crate::domain::evaluation::{CompositeWeights, RobustnessConfig};
use crate::domain::evidence::DEFAULT_TOP_K;
use crate::domain::llm::{BackendKind, BackendSpec, GenerationParams};
use crate::infrastructure::observability::MetricsConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub data: DataConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// Generation backends and the one active at startup
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_active_backend")]
    pub active: String,
    /// Bound on one synthesis call; exceeding it triggers the fallback answer
    #[serde(default = "default_synthesis_timeout_secs")]
    pub synthesis_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub generation: GenerationParams,
    #[serde(default = "default_models")]
    pub models: Vec<BackendSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub robustness: RobustnessConfig,
    #[serde(default)]
    pub composite_weights: CompositeWeights,
}

/// Data files; unset paths use the copies compiled into the binary
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DataConfig {
    #[serde(default)]
    pub evidence_catalog: Option<PathBuf>,
    #[serde(default)]
    pub rules: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_level() -> String {
    "info".to_string()
}

fn default_active_backend() -> String {
    "llama3.2".to_string()
}

fn default_synthesis_timeout_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_models() -> Vec<BackendSpec> {
    vec![
        BackendSpec::new("llama3.2", BackendKind::Local, "llama3.2:3b"),
        BackendSpec::new("gpt-4o-mini", BackendKind::Remote, "gpt-4o-mini")
            .with_api_key_env("OPENAI_API_KEY"),
    ]
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_max_query_chars() -> usize {
    4000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            active: default_active_backend(),
            synthesis_timeout_secs: default_synthesis_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            generation: GenerationParams::default(),
            models: default_models(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_query_chars: default_max_query_chars(),
            classifier: ClassifierConfig::default(),
            robustness: RobustnessConfig::default(),
            composite_weights: CompositeWeights::default(),
        }
    }
}

impl AppConfig {
    /// `config/default`, then `config/local`, then `APP__SECTION__KEY` variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(content: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.backend.active, "llama3.2");
        assert_eq!(config.backend.models.len(), 2);
        assert_eq!(config.pipeline.top_k, 3);
        assert_eq!(config.pipeline.classifier.cross_threshold, 0.15);
        assert!(config.data.rules.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = from_toml(
            r#"
            [logging]
            format = "json"

            [pipeline]
            top_k = 5

            [pipeline.classifier]
            single_threshold = 0.3
            "#,
        );

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.pipeline.top_k, 5);
        assert_eq!(config.pipeline.classifier.single_threshold, 0.3);
        assert_eq!(config.pipeline.classifier.cross_threshold, 0.15);
        assert_eq!(config.backend.synthesis_timeout_secs, 60);
    }

    #[test]
    fn test_model_registry_entries() {
        let config = from_toml(
            r#"
            [backend]
            active = "remote"

            [[backend.models]]
            name = "remote"
            kind = "remote"
            model = "gpt-4o"
            api_key_env = "MY_KEY"
            "#,
        );

        assert_eq!(config.backend.models.len(), 1);
        assert_eq!(config.backend.models[0].kind, BackendKind::Remote);
        assert_eq!(config.backend.models[0].api_key_env.as_deref(), Some("MY_KEY"));
    }
}
