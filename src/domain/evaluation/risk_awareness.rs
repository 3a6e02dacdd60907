//! Risk-awareness: does the answer warn, hedge and disclaim?

use std::sync::Arc;

use super::{MetricName, MetricScore, Scorer, ScoringInput};
use crate::domain::rules::RuleTables;
use crate::domain::text::{count_phrase, tokenize};
use crate::domain::DomainError;

const DISCLAIMER_WEIGHT: f64 = 0.40;
const RISK_TERMS_WEIGHT: f64 = 0.30;
const RISK_TERMS_CAP: usize = 6;
const LIMITATIONS_WEIGHT: f64 = 0.30;
const LIMITATIONS_CAP: usize = 4;

#[derive(Debug, Clone)]
pub struct RiskAwarenessScorer {
    rules: Arc<RuleTables>,
}

impl RiskAwarenessScorer {
    pub fn new(rules: Arc<RuleTables>) -> Self {
        Self { rules }
    }
}

fn capped_share(count: usize, cap: usize, weight: f64) -> f64 {
    weight * count.min(cap) as f64 / cap as f64
}

impl Scorer for RiskAwarenessScorer {
    fn name(&self) -> MetricName {
        MetricName::RiskAwareness
    }

    fn score(&self, input: &ScoringInput<'_>) -> Result<MetricScore, DomainError> {
        let lowered = input.answer.to_lowercase();
        let tokens = tokenize(input.answer);

        let has_disclaimer = self
            .rules
            .disclaimers
            .markers
            .iter()
            .any(|m| lowered.contains(&m.to_lowercase()));
        let disclaimer = if has_disclaimer { DISCLAIMER_WEIGHT } else { 0.0 };

        let risk_count: usize = self
            .rules
            .evaluation
            .risk_terms
            .for_domain(input.domain)
            .into_iter()
            .map(|t| count_phrase(&tokens, t))
            .sum();

        let limitation_count: usize = self
            .rules
            .evaluation
            .limitation_phrases
            .iter()
            .map(|p| count_phrase(&tokens, p))
            .sum();

        let risk_terms = capped_share(risk_count, RISK_TERMS_CAP, RISK_TERMS_WEIGHT);
        let limitations = capped_share(limitation_count, LIMITATIONS_CAP, LIMITATIONS_WEIGHT);

        Ok(
            MetricScore::new(MetricName::RiskAwareness, disclaimer + risk_terms + limitations)
                .with_component("disclaimer", disclaimer)
                .with_component("risk_terms", risk_terms)
                .with_component("risk_term_count", risk_count as f64)
                .with_component("limitations", limitations),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    fn score(answer: &str, domain: Domain) -> MetricScore {
        RiskAwarenessScorer::new(Arc::new(RuleTables::builtin().unwrap()))
            .score(&ScoringInput::new("q", answer, domain))
            .unwrap()
    }

    #[test]
    fn test_disclaimer_alone_reaches_point_four() {
        let rules = RuleTables::builtin().unwrap();
        let s = score(&format!("Aspirin.\n\n---\n{}", rules.disclaimers.medical), Domain::Medical);
        assert!(s.value >= 0.4);
        assert_eq!(s.breakdown["disclaimer"], 0.4);
    }

    #[test]
    fn test_risk_terms_use_domain_vocabulary() {
        let medical = score("Bleeding and other side effects are a risk.", Domain::Medical);
        assert_eq!(medical.breakdown["risk_term_count"], 3.0);

        let finance = score("Bleeding and other side effects are a risk.", Domain::Finance);
        assert_eq!(finance.breakdown["risk_term_count"], 1.0);
    }

    #[test]
    fn test_caps_keep_score_bounded() {
        let text = "risk ".repeat(20) + &"may vary, consult ".repeat(10);
        let s = score(&text, Domain::Finance);
        assert!((s.breakdown["risk_terms"] - 0.3).abs() < 1e-9);
        assert!((s.breakdown["limitations"] - 0.3).abs() < 1e-9);
        assert!(s.value <= 1.0);
    }

    #[test]
    fn test_empty_answer() {
        assert_eq!(score("", Domain::General).value, 0.0);
    }
}
