//! Infrastructure layer - backends, data loading, logging and metrics

pub mod data;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod services;
