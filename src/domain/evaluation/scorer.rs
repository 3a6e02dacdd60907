use std::fmt::Debug;

use super::{MetricName, MetricScore};
use crate::domain::evidence::EvidenceMatch;
use crate::domain::{Domain, DomainError};

/// Everything a scorer may look at for one answer
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub query: &'a str,
    pub answer: &'a str,
    pub domain: Domain,
    pub evidence: &'a [EvidenceMatch],
    /// Confidence stated on the response
    pub confidence: f64,
    /// Caller-supplied paraphrases for the robustness scorer
    pub variants: Option<&'a [String]>,
}

impl<'a> ScoringInput<'a> {
    pub fn new(query: &'a str, answer: &'a str, domain: Domain) -> Self {
        Self {
            query,
            answer,
            domain,
            evidence: &[],
            confidence: 0.0,
            variants: None,
        }
    }

    pub fn with_evidence(mut self, evidence: &'a [EvidenceMatch]) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_variants(mut self, variants: &'a [String]) -> Self {
        self.variants = Some(variants);
        self
    }
}

/// One FAIR dimension
pub trait Scorer: Send + Sync + Debug {
    fn name(&self) -> MetricName;

    fn score(&self, input: &ScoringInput<'_>) -> Result<MetricScore, DomainError>;
}
