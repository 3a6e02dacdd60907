//! Classify command - domain routing only, no backend needed

use clap::Args;

use std::sync::Arc;

use crate::domain::DomainClassifier;
use crate::infrastructure::data;

#[derive(Args)]
pub struct ClassifyArgs {
    /// Text to classify
    pub query: String,
}

pub fn run(args: ClassifyArgs) -> anyhow::Result<()> {
    let config = super::load_oneshot_config();
    let rules = data::load_rules(config.data.rules.as_deref())?;
    let classifier = DomainClassifier::new(Arc::new(rules), config.pipeline.classifier);

    let c = classifier.classify(&args.query);
    println!(
        "{} (confidence {:.2}, finance {:.2}, medical {:.2})",
        c.domain, c.confidence, c.finance_score, c.medical_score
    );
    Ok(())
}
