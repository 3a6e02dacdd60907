//! FAIR evaluation: six independent scorers and the aggregator

mod aggregator;
mod calibration;
mod faithfulness;
mod interpretability;
mod metric;
mod risk_awareness;
mod robustness;
mod safety;
mod scorer;

pub use aggregator::{Aggregator, CompositeWeights, EvaluationResult};
pub use calibration::CalibrationScorer;
pub use faithfulness::FaithfulnessScorer;
pub use interpretability::InterpretabilityScorer;
pub use metric::{MetricName, MetricScore};
pub use risk_awareness::RiskAwarenessScorer;
pub use robustness::{RobustnessConfig, RobustnessScorer, VariantGenerator};
pub use safety::SafetyScorer;
pub use scorer::{Scorer, ScoringInput};

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::warn;

use super::classifier::DomainClassifier;
use super::evidence::EvidenceRetriever;
use super::rules::RuleTables;

/// Runs every scorer, isolating failures so one scorer cannot sink the others
#[derive(Debug, Clone)]
pub struct FairEvaluator {
    scorers: Vec<Arc<dyn Scorer>>,
}

impl FairEvaluator {
    pub fn new(scorers: Vec<Arc<dyn Scorer>>) -> Self {
        Self { scorers }
    }

    /// The standard six scorers
    pub fn standard(
        rules: Arc<RuleTables>,
        classifier: DomainClassifier,
        retriever: EvidenceRetriever,
        robustness: RobustnessConfig,
    ) -> Self {
        let variants = VariantGenerator::new(rules.robustness.clone());
        Self::new(vec![
            Arc::new(FaithfulnessScorer::new(rules.clone())),
            Arc::new(InterpretabilityScorer::new(rules.clone())),
            Arc::new(RiskAwarenessScorer::new(rules.clone())),
            Arc::new(CalibrationScorer::new(rules.clone())),
            Arc::new(RobustnessScorer::new(classifier, retriever, variants, robustness)),
            Arc::new(SafetyScorer::new(rules)),
        ])
    }

    pub fn evaluate(&self, input: &ScoringInput<'_>) -> Vec<MetricScore> {
        self.scorers
            .iter()
            .map(|scorer| run_isolated(scorer.as_ref(), input))
            .collect()
    }
}

fn run_isolated(scorer: &dyn Scorer, input: &ScoringInput<'_>) -> MetricScore {
    let name = scorer.name();
    let outcome = catch_unwind(AssertUnwindSafe(|| scorer.score(input)));

    let message = match outcome {
        Ok(Ok(score)) if score.name == name => return score,
        Ok(Ok(score)) => format!("scorer reported metric '{}'", score.name),
        Ok(Err(e)) => e.to_string(),
        Err(panic) => panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "scorer panicked".to_string()),
    };

    warn!(scorer = %name, error = %message, "Scorer failed");
    MetricScore::failed(name, message)
}
