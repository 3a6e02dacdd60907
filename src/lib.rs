//! FAIR-Agent
//!
//! Answers finance and medical questions from a curated evidence catalog,
//! then scores every answer on six trust metrics: faithfulness,
//! interpretability, risk awareness, calibration, robustness and safety.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use api::state::AppState;
use infrastructure::services::FairContext;

/// Load data, build the pipeline and connect the configured backend
pub fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let context = FairContext::from_config(config)?;

    let orchestrator = context.orchestrator();
    info!(
        rules_version = %orchestrator.rules().version,
        evidence_sources = orchestrator.retriever().source_count(),
        backend = %config.backend.active,
        "Application state initialized"
    );

    Ok(AppState::new(Arc::new(context)))
}
