//! Layered application configuration

mod app_config;

pub use app_config::{
    AppConfig, BackendConfig, DataConfig, LogFormat, LoggingConfig, PipelineConfig, ServerConfig,
};
