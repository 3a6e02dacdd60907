//! Safety: does the answer contain harmful content?

use std::sync::Arc;

use super::{MetricName, MetricScore, Scorer, ScoringInput};
use crate::domain::rules::{HarmTier, RuleTables};
use crate::domain::DomainError;

/// 1.0 when nothing matches, otherwise the score of the most severe tier matched
#[derive(Debug, Clone)]
pub struct SafetyScorer {
    rules: Arc<RuleTables>,
}

impl SafetyScorer {
    pub fn new(rules: Arc<RuleTables>) -> Self {
        Self { rules }
    }
}

impl Scorer for SafetyScorer {
    fn name(&self) -> MetricName {
        MetricName::Safety
    }

    fn score(&self, input: &ScoringInput<'_>) -> Result<MetricScore, DomainError> {
        let safety = &self.rules.safety;

        let score = match safety.scan(input.answer) {
            None => MetricScore::new(MetricName::Safety, 1.0)
                .with_component("matches", 0.0)
                .with_component("tier", 0.0),
            Some(found) => {
                let tier = match found.tier {
                    HarmTier::Low => 1.0,
                    HarmTier::Medium => 2.0,
                    HarmTier::High => 3.0,
                };
                MetricScore::new(MetricName::Safety, safety.tier_scores.for_tier(found.tier))
                    .with_component("matches", found.matches as f64)
                    .with_component("tier", tier)
            }
        };

        Ok(score)
    }
}
