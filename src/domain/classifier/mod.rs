//! Domain classification by weighted keyword and pattern matching

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::rules::{DomainKeywords, RuleTables};
use super::text::{contains_phrase, tokenize};
use super::Domain;

/// Decision thresholds for the classifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Both domain scores at or above this make a query cross-domain
    #[serde(default = "default_cross_threshold")]
    pub cross_threshold: f64,
    /// The higher score at or above this selects a single domain
    #[serde(default = "default_single_threshold")]
    pub single_threshold: f64,
    /// Confidence floor for queries made only of strong indicator terms
    #[serde(default = "default_strong_indicator_confidence")]
    pub strong_indicator_confidence: f64,
}

fn default_cross_threshold() -> f64 {
    0.15
}

fn default_single_threshold() -> f64 {
    0.2
}

fn default_strong_indicator_confidence() -> f64 {
    0.8
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            cross_threshold: default_cross_threshold(),
            single_threshold: default_single_threshold(),
            strong_indicator_confidence: default_strong_indicator_confidence(),
        }
    }
}

impl ClassifierConfig {
    pub fn with_cross_threshold(mut self, threshold: f64) -> Self {
        self.cross_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_single_threshold(mut self, threshold: f64) -> Self {
        self.single_threshold = threshold.clamp(0.0, 1.0);
        self
    }
}

/// Which rule produced the decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationReason {
    StrongIndicator,
    BothAboveCrossThreshold,
    TiedScores,
    AboveSingleThreshold,
    BelowThreshold,
    NoContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub domain: Domain,
    pub confidence: f64,
    pub finance_score: f64,
    pub medical_score: f64,
    pub reason: ClassificationReason,
}

/// Pure function of the query text and the static keyword tables
#[derive(Debug, Clone)]
pub struct DomainClassifier {
    rules: Arc<RuleTables>,
    config: ClassifierConfig,
}

impl DomainClassifier {
    pub fn new(rules: Arc<RuleTables>, config: ClassifierConfig) -> Self {
        Self { rules, config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn classify(&self, text: &str) -> Classification {
        let tokens = tokenize(text);
        let content: Vec<&String> = tokens
            .iter()
            .filter(|t| !self.rules.stopwords.contains(*t))
            .collect();

        if content.is_empty() {
            return Classification {
                domain: Domain::General,
                confidence: 0.0,
                finance_score: 0.0,
                medical_score: 0.0,
                reason: ClassificationReason::NoContent,
            };
        }

        let finance_table = &self.rules.classifier.finance;
        let medical_table = &self.rules.classifier.medical;
        let finance_score = domain_score(finance_table, text, &tokens, content.len());
        let medical_score = domain_score(medical_table, text, &tokens, content.len());
        let top = finance_score.max(medical_score);

        let all_strong = |table: &DomainKeywords| {
            content
                .iter()
                .all(|t| table.strong_indicators.contains(t.as_str()))
        };

        let strong = if all_strong(finance_table) {
            Some((Domain::Finance, finance_score))
        } else if all_strong(medical_table) {
            Some((Domain::Medical, medical_score))
        } else {
            None
        };

        let (domain, confidence, reason) = match strong {
            Some((domain, score)) => (
                domain,
                score.max(self.config.strong_indicator_confidence),
                ClassificationReason::StrongIndicator,
            ),
            None => self.decide(finance_score, medical_score, top),
        };

        Classification {
            domain,
            confidence: confidence.clamp(0.0, 1.0),
            finance_score,
            medical_score,
            reason,
        }
    }

    fn decide(&self, finance: f64, medical: f64, top: f64) -> (Domain, f64, ClassificationReason) {
        let ClassifierConfig {
            cross_threshold,
            single_threshold,
            ..
        } = self.config;

        if finance >= cross_threshold && medical >= cross_threshold {
            (Domain::CrossDomain, top, ClassificationReason::BothAboveCrossThreshold)
        } else if finance == medical && top >= single_threshold {
            (Domain::CrossDomain, top, ClassificationReason::TiedScores)
        } else if top >= single_threshold {
            let domain = if finance > medical {
                Domain::Finance
            } else {
                Domain::Medical
            };
            (domain, top, ClassificationReason::AboveSingleThreshold)
        } else {
            (Domain::General, top, ClassificationReason::BelowThreshold)
        }
    }
}

/// Sum of matched keyword and pattern weights over the content-token count, clipped to [0, 1]
fn domain_score(table: &DomainKeywords, text: &str, tokens: &[String], content_len: usize) -> f64 {
    let keyword_weight: f64 = table
        .keywords
        .iter()
        .filter(|(term, _)| contains_phrase(tokens, term))
        .map(|(_, weight)| weight)
        .sum();

    let pattern_weight: f64 = table
        .patterns
        .iter()
        .filter(|p| p.is_match(text))
        .map(|p| p.weight())
        .sum();

    ((keyword_weight + pattern_weight) / content_len as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> DomainClassifier {
        DomainClassifier::new(
            Arc::new(RuleTables::builtin().unwrap()),
            ClassifierConfig::default(),
        )
    }

    #[test]
    fn test_medical_query() {
        let result = classifier().classify("What are the side effects of aspirin?");
        assert_eq!(result.domain, Domain::Medical);
        assert!(result.confidence > 0.2);
        assert_eq!(result.finance_score, 0.0);
    }

    #[test]
    fn test_cross_domain_query() {
        let result =
            classifier().classify("How does stress affect heart health and retirement savings?");
        assert_eq!(result.domain, Domain::CrossDomain);
        assert_eq!(result.reason, ClassificationReason::BothAboveCrossThreshold);
        assert!(result.finance_score >= 0.15);
        assert!(result.medical_score >= 0.15);
    }

    #[test]
    fn test_general_query() {
        let result = classifier().classify("tell me a joke");
        assert_eq!(result.domain, Domain::General);
        assert_eq!(result.finance_score, 0.0);
        assert_eq!(result.medical_score, 0.0);
    }

    #[test]
    fn test_strong_indicators_bypass_thresholds() {
        let c = classifier();
        for query in ["diabetes", "Diabetes?", "insulin cholesterol", "aspirin"] {
            let result = c.classify(query);
            assert_eq!(result.domain, Domain::Medical, "{query}");
            assert!(result.confidence >= 0.8);
            assert_eq!(result.reason, ClassificationReason::StrongIndicator);
        }
        assert_eq!(c.classify("portfolio").domain, Domain::Finance);
    }

    #[test]
    fn test_finance_query_with_patterns() {
        let result = classifier().classify("Should I put $5,000 into index funds or pay debt?");
        assert_eq!(result.domain, Domain::Finance);
    }

    #[test]
    fn test_tie_resolves_to_cross_domain() {
        let rules = Arc::new(RuleTables::builtin().unwrap());
        let config = ClassifierConfig::default()
            .with_cross_threshold(0.9)
            .with_single_threshold(0.2);
        let result = DomainClassifier::new(rules, config).classify("bank blood");
        assert_eq!(result.finance_score, result.medical_score);
        assert_eq!(result.domain, Domain::CrossDomain);
        assert_eq!(result.reason, ClassificationReason::TiedScores);
    }

    #[test]
    fn test_empty_and_unicode_queries() {
        let c = classifier();
        for query in ["", "   ", "🙂🙂🙂", "Ωμέγα ∑ ∫ 日本語", "the of and"] {
            let result = c.classify(query);
            assert_eq!(result.domain, Domain::General);
            assert!((0.0..=1.0).contains(&result.confidence));
        }
    }

    #[test]
    fn test_classify_is_deterministic() {
        let c = classifier();
        let query = "Is bitcoin a good hedge against inflation?";
        assert_eq!(c.classify(query), c.classify(query));
    }

    #[test]
    fn test_scores_are_clipped() {
        let result = classifier().classify("stocks bonds dividends $100 5% portfolio");
        assert!(result.finance_score <= 1.0);
        assert!(result.confidence <= 1.0);
    }
}
