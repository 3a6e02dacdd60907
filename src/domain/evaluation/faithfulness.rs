//! Faithfulness: is the answer grounded in the retrieved evidence?

use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::{MetricName, MetricScore, Scorer, ScoringInput};
use crate::domain::rules::RuleTables;
use crate::domain::text::{contains_phrase, tokenize, word_count};
use crate::domain::DomainError;

static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[(?:source\s*)?(\d{1,3})\]").expect("valid citation regex")
});

static REFERENCE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[\d{1,3}\]").expect("valid reference line regex"));

static QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""[^"\n]{3,}"|“[^”\n]{3,}”"#).expect("valid quotation regex")
});

const CITATION_WEIGHT: f64 = 0.4;
const SECOND_CITATION_WEIGHT: f64 = 0.2;
const RELIABILITY_WEIGHT: f64 = 0.2;
const ATTRIBUTION_WEIGHT: f64 = 0.2;
const HIGH_RELIABILITY: f64 = 0.9;

#[derive(Debug, Clone)]
pub struct FaithfulnessScorer {
    rules: Arc<RuleTables>,
}

impl FaithfulnessScorer {
    pub fn new(rules: Arc<RuleTables>) -> Self {
        Self { rules }
    }

    /// Distinct in-text markers that point at an existing evidence entry
    ///
    /// Reference-list lines (starting with `[N]`) are not in-text citations.
    fn citation_markers(answer: &str, evidence_len: usize) -> usize {
        answer
            .lines()
            .filter(|line| !REFERENCE_LINE.is_match(line))
            .flat_map(|line| CITATION.captures_iter(line))
            .filter_map(|cap| cap.get(1)?.as_str().parse::<usize>().ok())
            .filter(|n| (1..=evidence_len).contains(n))
            .collect::<BTreeSet<_>>()
            .len()
    }

    fn has_attribution(&self, answer: &str) -> bool {
        let tokens = tokenize(answer);
        self.rules
            .evaluation
            .attribution_phrases
            .iter()
            .any(|p| contains_phrase(&tokens, p))
            || QUOTED.is_match(answer)
    }
}

impl Scorer for FaithfulnessScorer {
    fn name(&self) -> MetricName {
        MetricName::Faithfulness
    }

    fn score(&self, input: &ScoringInput<'_>) -> Result<MetricScore, DomainError> {
        let markers = Self::citation_markers(input.answer, input.evidence.len());
        let top_reliability = input
            .evidence
            .iter()
            .map(|m| m.source.reliability_score)
            .fold(0.0, f64::max);

        let citation = if markers >= 1 { CITATION_WEIGHT } else { 0.0 }
            + if markers >= 2 { SECOND_CITATION_WEIGHT } else { 0.0 };
        let reliability = if top_reliability >= HIGH_RELIABILITY {
            RELIABILITY_WEIGHT
        } else {
            0.0
        };
        let attribution = if self.has_attribution(input.answer) {
            ATTRIBUTION_WEIGHT
        } else {
            0.0
        };

        let raw = (citation + reliability + attribution).min(1.0);

        let rules = &self.rules.evaluation;
        let domain_factor = rules.faithfulness_domain_factor.get(input.domain);
        let min_words = rules.min_answer_words.max(1) as f64;
        let length_factor = (word_count(input.answer) as f64 / min_words).clamp(0.5, 1.0);

        Ok(MetricScore::new(MetricName::Faithfulness, raw * domain_factor * length_factor)
            .with_component("citation_markers", markers as f64)
            .with_component("citations", citation)
            .with_component("reliability", reliability)
            .with_component("attribution", attribution)
            .with_component("domain_factor", domain_factor)
            .with_component("length_factor", length_factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evidence::{EvidenceMatch, EvidenceSource};
    use crate::domain::Domain;

    fn scorer() -> FaithfulnessScorer {
        FaithfulnessScorer::new(Arc::new(RuleTables::builtin().unwrap()))
    }

    fn evidence(reliability: &[f64]) -> Vec<EvidenceMatch> {
        reliability
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let source = EvidenceSource::new(format!("s{i}"), "T", "B", Domain::Medical, *r);
                EvidenceMatch::new(Arc::new(source), 1.0)
            })
            .collect()
    }

    fn long(text: &str) -> String {
        format!("{} {}", text, "filler ".repeat(40))
    }

    #[test]
    fn test_no_evidence_scores_low() {
        let answer = long("Here is a joke according to my memory.");
        let input = ScoringInput::new("tell me a joke", &answer, Domain::General);
        let score = scorer().score(&input).unwrap();
        assert!(score.value <= 0.2, "{}", score.value);
        assert_eq!(score.breakdown["citation_markers"], 0.0);
    }

    #[test]
    fn test_cited_reliable_answer() {
        let evidence = evidence(&[0.95, 0.9]);
        let answer = long("Aspirin can cause bleeding [Source 1]. Ulcers are possible [2].");
        let input =
            ScoringInput::new("aspirin", &answer, Domain::Medical).with_evidence(&evidence);
        let score = scorer().score(&input).unwrap();

        assert_eq!(score.breakdown["citation_markers"], 2.0);
        assert!((score.breakdown["citations"] - 0.6).abs() < 1e-9);
        assert_eq!(score.breakdown["reliability"], 0.2);
        assert!((score.value - 0.8 * 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_markers_beyond_evidence_and_reference_lines_ignored() {
        let evidence = evidence(&[0.8]);
        let answer = long("Claim [7].\n[1] Some Title");
        let input = ScoringInput::new("q", &answer, Domain::Finance).with_evidence(&evidence);
        let score = scorer().score(&input).unwrap();
        assert_eq!(score.breakdown["citation_markers"], 0.0);
    }

    #[test]
    fn test_short_answer_penalized() {
        let evidence = evidence(&[0.95]);
        let input = ScoringInput::new("q", "See [1].", Domain::Medical).with_evidence(&evidence);
        let score = scorer().score(&input).unwrap();
        assert_eq!(score.breakdown["length_factor"], 0.5);
    }

    #[test]
    fn test_empty_and_unicode_answers_bounded() {
        for answer in ["", "“”", "[999999999999]", "ümlaut “quoted text here” 🙂"] {
            let input = ScoringInput::new("", answer, Domain::CrossDomain);
            let value = scorer().score(&input).unwrap().value;
            assert!((0.0..=1.0).contains(&value));
        }
    }
}
