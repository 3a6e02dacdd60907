//! Robustness: do paraphrased queries land on the same domain and evidence?

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{MetricName, MetricScore, Scorer, ScoringInput};
use crate::domain::classifier::DomainClassifier;
use crate::domain::evidence::EvidenceRetriever;
use crate::domain::rules::RobustnessRules;
use crate::domain::{Domain, DomainError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RobustnessConfig {
    /// Minimum Jaccard overlap of evidence ids for a variant to count as consistent
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_similarity_threshold() -> f64 {
    0.5
}

fn default_top_k() -> usize {
    3
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            top_k: default_top_k(),
        }
    }
}

/// Deterministic query perturbations built from the rule tables
#[derive(Debug, Clone)]
pub struct VariantGenerator {
    rules: RobustnessRules,
}

impl VariantGenerator {
    pub fn new(rules: RobustnessRules) -> Self {
        Self { rules }
    }

    /// Synonym swap, typo injection, adversarial prefixes, noise and a flattened form.
    /// Variants identical to the query or to each other are dropped.
    pub fn generate(&self, query: &str) -> Vec<String> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let mut candidates = vec![
            replace_words(query, |w| self.rules.synonyms.get(w).cloned()),
            replace_words(query, |w| self.rules.typos.get(w).cloned()),
        ];

        candidates.extend(
            self.rules
                .adversarial_prefixes
                .iter()
                .map(|prefix| format!("{}{}", prefix, query)),
        );

        candidates.extend(
            self.rules
                .noise_insertions
                .iter()
                .map(|noise| insert_at_middle(query, noise)),
        );

        candidates.push(
            query
                .to_lowercase()
                .chars()
                .filter(|c| !c.is_ascii_punctuation())
                .collect(),
        );

        let mut seen = BTreeSet::new();
        seen.insert(query.to_string());
        candidates
            .into_iter()
            .filter(|v| !v.trim().is_empty() && seen.insert(v.clone()))
            .collect()
    }
}

/// Replace whole words (case-insensitive, trailing punctuation preserved)
fn replace_words(text: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    text.split(' ')
        .map(|word| {
            let core = word.trim_end_matches(|c: char| c.is_ascii_punctuation());
            let suffix = &word[core.len()..];
            match lookup(&core.to_lowercase()) {
                Some(replacement) => format!("{}{}", replacement, suffix),
                None => word.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn insert_at_middle(text: &str, noise: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mid = words.len() / 2;
    let (head, tail) = words.split_at(mid);
    format!("{}{}{}", head.join(" "), noise, tail.join(" "))
        .trim()
        .to_string()
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}

/// Re-runs classification and retrieval over a variant batch
#[derive(Debug, Clone)]
pub struct RobustnessScorer {
    classifier: DomainClassifier,
    retriever: EvidenceRetriever,
    variants: VariantGenerator,
    config: RobustnessConfig,
}

impl RobustnessScorer {
    pub fn new(
        classifier: DomainClassifier,
        retriever: EvidenceRetriever,
        variants: VariantGenerator,
        config: RobustnessConfig,
    ) -> Self {
        Self {
            classifier,
            retriever,
            variants,
            config,
        }
    }

    fn observe(&self, text: &str) -> (Domain, BTreeSet<String>) {
        let domain = self.classifier.classify(text).domain;
        let evidence = if domain == Domain::General {
            BTreeSet::new()
        } else {
            self.retriever
                .retrieve(text, domain, self.config.top_k)
                .into_iter()
                .map(|m| m.source.id.clone())
                .collect()
        };
        (domain, evidence)
    }
}

impl Scorer for RobustnessScorer {
    fn name(&self) -> MetricName {
        MetricName::Robustness
    }

    fn score(&self, input: &ScoringInput<'_>) -> Result<MetricScore, DomainError> {
        let generated;
        let variants: &[String] = match input.variants {
            Some(supplied) => supplied,
            None => {
                generated = self.variants.generate(input.query);
                &generated
            }
        };

        if variants.is_empty() {
            return Ok(MetricScore::new(MetricName::Robustness, 1.0)
                .with_component("variants", 0.0));
        }

        let (base_domain, base_evidence) = self.observe(input.query);

        let mut consistent = 0usize;
        let mut same_domain = 0usize;
        let mut overlap_total = 0.0;

        for variant in variants {
            let (domain, evidence) = self.observe(variant);
            let overlap = jaccard(&base_evidence, &evidence);
            overlap_total += overlap;

            if domain == base_domain {
                same_domain += 1;
                if overlap >= self.config.similarity_threshold {
                    consistent += 1;
                }
            }
        }

        let n = variants.len() as f64;
        Ok(MetricScore::new(MetricName::Robustness, consistent as f64 / n)
            .with_component("variants", n)
            .with_component("domain_consistency", same_domain as f64 / n)
            .with_component("evidence_overlap", overlap_total / n))
    }
}
