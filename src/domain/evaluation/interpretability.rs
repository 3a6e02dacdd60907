//! Interpretability: does the answer show its reasoning?

use std::sync::Arc;

use super::{MetricName, MetricScore, Scorer, ScoringInput};
use crate::domain::rules::RuleTables;
use crate::domain::text::{contains_phrase, count_phrase, has_step_markers, tokenize};
use crate::domain::DomainError;

const STEPS_WEIGHT: f64 = 0.35;
const HEADERS_WEIGHT: f64 = 0.25;
const DEFINITION_WEIGHT: f64 = 0.20;
const CONNECTIVES_WEIGHT: f64 = 0.20;
const CONNECTIVES_CAP: usize = 4;

#[derive(Debug, Clone)]
pub struct InterpretabilityScorer {
    rules: Arc<RuleTables>,
}

impl InterpretabilityScorer {
    pub fn new(rules: Arc<RuleTables>) -> Self {
        Self { rules }
    }

    /// Canonical headers that appear on a line of their own, ignoring markdown decoration
    fn headers_present(&self, answer: &str) -> usize {
        self.rules
            .evaluation
            .section_headers
            .iter()
            .filter(|header| {
                answer.lines().any(|line| {
                    line.trim()
                        .trim_matches(|c: char| {
                            c == '#' || c == '*' || c == ':' || c.is_whitespace()
                        })
                        .eq_ignore_ascii_case(header)
                })
            })
            .count()
    }
}

impl Scorer for InterpretabilityScorer {
    fn name(&self) -> MetricName {
        MetricName::Interpretability
    }

    fn score(&self, input: &ScoringInput<'_>) -> Result<MetricScore, DomainError> {
        let rules = &self.rules.evaluation;
        let tokens = tokenize(input.answer);

        let steps = if has_step_markers(input.answer) {
            STEPS_WEIGHT
        } else {
            0.0
        };

        let header_count = self.headers_present(input.answer);
        let headers =
            HEADERS_WEIGHT * header_count as f64 / rules.section_headers.len().max(1) as f64;

        let definition = if rules
            .definition_phrases
            .iter()
            .any(|p| contains_phrase(&tokens, p))
        {
            DEFINITION_WEIGHT
        } else {
            0.0
        };

        let connective_count: usize = rules
            .connectives
            .iter()
            .map(|c| count_phrase(&tokens, c))
            .sum();
        let connectives = CONNECTIVES_WEIGHT * connective_count.min(CONNECTIVES_CAP) as f64
            / CONNECTIVES_CAP as f64;

        let value = steps + headers + definition + connectives;
        Ok(MetricScore::new(MetricName::Interpretability, value)
            .with_component("steps", steps)
            .with_component("headers", headers)
            .with_component("definition", definition)
            .with_component("connectives", connectives))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    fn score(answer: &str) -> MetricScore {
        InterpretabilityScorer::new(Arc::new(RuleTables::builtin().unwrap()))
            .score(&ScoringInput::new("q", answer, Domain::Finance))
            .unwrap()
    }

    #[test]
    fn test_fully_structured_answer() {
        let answer = "**Analysis**\n\
            Step 1: A bond refers to a loan made to an issuer.\n\
            Step 2: Prices fall when rates rise because yields adjust.\n\
            \n**Evidence**\n[1] Interest Rate and Bond Price Relationship\n\
            \n**Conclusion**\nTherefore duration matters. However, additionally, consider fees.";
        let s = score(answer);

        assert_eq!(s.breakdown["steps"], 0.35);
        assert!((s.breakdown["headers"] - 0.25).abs() < 1e-9);
        assert_eq!(s.breakdown["definition"], 0.2);
        assert!((s.breakdown["connectives"] - 0.2).abs() < 1e-9);
        assert!((s.value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_enumerated_list_counts_as_steps() {
        assert_eq!(score("Options:\n1. Save\n2. Invest").breakdown["steps"], 0.35);
    }

    #[test]
    fn test_connectives_capped() {
        let s = score("because because because because because because");
        assert!((s.breakdown["connectives"] - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_plain_text_scores_zero() {
        let s = score("Just a sentence without structure");
        assert_eq!(s.value, 0.0);
    }

    #[test]
    fn test_empty_and_unicode() {
        for answer in ["", "🙂\n###\n***", "步骤 1: 中文"] {
            assert!((0.0..=1.0).contains(&score(answer).value));
        }
    }
}
