//! Ask command - one query through the full pipeline

use clap::Args;

use crate::api::types::QueryResponse;
use crate::domain::{MetricName, Query};
use crate::infrastructure::services::FairContext;

#[derive(Args)]
pub struct AskArgs {
    /// Question to answer
    pub query: String,

    /// Registered model name to answer with
    #[arg(short, long)]
    pub model: Option<String>,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: AskArgs) -> anyhow::Result<()> {
    let config = super::load_oneshot_config();
    let context = FairContext::from_config(&config)?;

    let result = context
        .process_query(&Query::anonymous(args.query), args.model.as_deref())
        .await?;

    if args.json {
        let response = QueryResponse::from_result(result, context.composite_weights());
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let composite = result.composite(context.composite_weights());
    let response = &result.response;
    println!("{}\n", response.enhanced_text);
    println!(
        "domain: {}  status: {}  model: {}  confidence: {:.2}",
        response.domain,
        response.status.as_str(),
        response.model_used,
        response.confidence
    );
    for name in MetricName::ALL {
        if let Some(score) = result.metric(name) {
            match &score.error {
                Some(err) => println!("  {:<17} failed ({})", name.as_str(), err),
                None => println!("  {:<17} {:.3}", name.as_str(), score.value),
            }
        }
    }
    println!("  {:<17} {:.3}", "composite", composite);

    Ok(())
}
