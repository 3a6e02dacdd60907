//! Calibration: does stated confidence match what the domain can deliver?

use std::sync::Arc;

use super::{MetricName, MetricScore, Scorer, ScoringInput};
use crate::domain::rules::RuleTables;
use crate::domain::DomainError;

/// `1 - |confidence - expected_accuracy(domain)|`
#[derive(Debug, Clone)]
pub struct CalibrationScorer {
    rules: Arc<RuleTables>,
}

impl CalibrationScorer {
    pub fn new(rules: Arc<RuleTables>) -> Self {
        Self { rules }
    }
}

impl Scorer for CalibrationScorer {
    fn name(&self) -> MetricName {
        MetricName::Calibration
    }

    fn score(&self, input: &ScoringInput<'_>) -> Result<MetricScore, DomainError> {
        if !input.confidence.is_finite() {
            return Err(DomainError::scorer(
                MetricName::Calibration.as_str(),
                "confidence is not a finite number",
            ));
        }

        let confidence = input.confidence.clamp(0.0, 1.0);
        let expected = self.rules.evaluation.expected_accuracy.get(input.domain);
        let gap = (confidence - expected).abs();

        Ok(MetricScore::new(MetricName::Calibration, 1.0 - gap)
            .with_component("confidence", confidence)
            .with_component("expected_accuracy", expected)
            .with_component("gap", gap))
    }
}
