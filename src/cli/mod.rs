//! Command line entry points
//!
//! - `serve`: HTTP API server
//! - `ask`: run one query through the pipeline and print the scored answer
//! - `classify`: print the domain classification of a query

pub mod ask;
pub mod classify;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::{AppConfig, LoggingConfig};
use crate::infrastructure::logging;

/// FAIR-Agent - evidence-grounded finance and medical answers with trust scoring
#[derive(Parser)]
#[command(name = "fair-agent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Answer a single query and print its FAIR scores
    Ask(ask::AskArgs),

    /// Classify a query without answering it
    Classify(classify::ClassifyArgs),
}

/// Config for one-shot commands: quieter logs unless `RUST_LOG` says otherwise
fn load_oneshot_config() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&LoggingConfig {
        level: "warn".to_string(),
        ..config.logging.clone()
    });
    config
}
