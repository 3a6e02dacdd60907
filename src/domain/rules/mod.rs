//! Versioned rule tables
//!
//! Keyword weights, harmful-content patterns, disclaimer templates and the
//! phrase lists used by the scorers. Loaded once at startup, validated, then
//! shared read-only behind an `Arc`.

mod harm;

pub use harm::{scan as scan_harm, HarmMatch, HarmPattern, HarmTier};

use std::collections::{BTreeMap, HashSet};

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use super::{Domain, DomainError};

const BUILTIN_RULES: &str = include_str!("../../../config/rules.toml");

/// All rule tables consumed by the engine
#[derive(Debug, Clone, Deserialize)]
pub struct RuleTables {
    pub version: String,
    #[serde(default)]
    pub stopwords: HashSet<String>,
    pub classifier: ClassifierRules,
    pub safety: SafetyRules,
    pub disclaimers: DisclaimerRules,
    pub prompts: DomainTemplates,
    pub fallback: DomainTemplates,
    pub evaluation: EvaluationRules,
    pub robustness: RobustnessRules,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierRules {
    pub finance: DomainKeywords,
    pub medical: DomainKeywords,
}

/// Weighted vocabulary for one specialized domain
#[derive(Debug, Clone, Deserialize)]
pub struct DomainKeywords {
    /// Term or multi-word phrase to weight in [0, 1]
    pub keywords: BTreeMap<String, f64>,
    #[serde(default)]
    pub strong_indicators: HashSet<String>,
    #[serde(default)]
    pub patterns: Vec<WeightedPattern>,
}

#[derive(Debug, Clone, Deserialize)]
struct WeightedPatternSpec {
    pattern: String,
    weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "WeightedPatternSpec")]
pub struct WeightedPattern {
    regex: Regex,
    weight: f64,
}

impl TryFrom<WeightedPatternSpec> for WeightedPattern {
    type Error = regex::Error;

    fn try_from(spec: WeightedPatternSpec) -> Result<Self, Self::Error> {
        let regex = RegexBuilder::new(&spec.pattern)
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            regex,
            weight: spec.weight,
        })
    }
}

impl WeightedPattern {
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SafetyRules {
    pub crisis_response: String,
    pub tier_scores: TierScores,
    pub harmful_patterns: Vec<HarmPattern>,
}

impl SafetyRules {
    pub fn scan(&self, text: &str) -> Option<HarmMatch> {
        scan_harm(&self.harmful_patterns, text)
    }
}

/// Safety score assigned when the most severe match is in a given tier
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TierScores {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl TierScores {
    pub fn for_tier(&self, tier: HarmTier) -> f64 {
        match tier {
            HarmTier::Low => self.low,
            HarmTier::Medium => self.medium,
            HarmTier::High => self.high,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisclaimerRules {
    pub medical: String,
    pub financial: String,
    pub emergency: String,
    pub professional: String,
    pub emergency_triggers: Vec<String>,
    pub advisory_indicators: Vec<String>,
    /// Phrases whose presence means a disclaimer block exists in a text
    pub markers: Vec<String>,
}

/// One text per domain; cross-domain falls back to general when absent
#[derive(Debug, Clone, Deserialize)]
pub struct DomainTemplates {
    pub finance: String,
    pub medical: String,
    #[serde(default)]
    pub cross_domain: Option<String>,
    pub general: String,
}

impl DomainTemplates {
    pub fn for_domain(&self, domain: Domain) -> &str {
        match domain {
            Domain::Finance => &self.finance,
            Domain::Medical => &self.medical,
            Domain::CrossDomain => self.cross_domain.as_deref().unwrap_or(&self.general),
            Domain::General => &self.general,
        }
    }
}

/// One number per domain
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DomainValues {
    pub finance: f64,
    pub medical: f64,
    pub cross_domain: f64,
    pub general: f64,
}

impl DomainValues {
    pub fn get(&self, domain: Domain) -> f64 {
        match domain {
            Domain::Finance => self.finance,
            Domain::Medical => self.medical,
            Domain::CrossDomain => self.cross_domain,
            Domain::General => self.general,
        }
    }

    fn all_within_unit(&self) -> bool {
        Domain::ALL
            .iter()
            .all(|d| (0.0..=1.0).contains(&self.get(*d)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationRules {
    pub attribution_phrases: Vec<String>,
    pub section_headers: Vec<String>,
    pub definition_phrases: Vec<String>,
    pub connectives: Vec<String>,
    pub limitation_phrases: Vec<String>,
    pub min_answer_words: usize,
    pub risk_terms: RiskTerms,
    pub expected_accuracy: DomainValues,
    pub faithfulness_domain_factor: DomainValues,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskTerms {
    pub finance: Vec<String>,
    pub medical: Vec<String>,
}

impl RiskTerms {
    /// Risk vocabulary for a domain; cross-domain and general use both lists
    pub fn for_domain(&self, domain: Domain) -> Vec<&str> {
        let mut terms: Vec<&str> = match domain {
            Domain::Finance => self.finance.iter().map(String::as_str).collect(),
            Domain::Medical => self.medical.iter().map(String::as_str).collect(),
            Domain::CrossDomain | Domain::General => self
                .finance
                .iter()
                .chain(self.medical.iter())
                .map(String::as_str)
                .collect(),
        };
        terms.sort_unstable();
        terms.dedup();
        terms
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RobustnessRules {
    pub adversarial_prefixes: Vec<String>,
    pub noise_insertions: Vec<String>,
    pub synonyms: BTreeMap<String, String>,
    pub typos: BTreeMap<String, String>,
}

impl RuleTables {
    /// Parse and validate rule tables from TOML
    pub fn from_toml_str(content: &str) -> Result<Self, DomainError> {
        let rules: RuleTables = toml::from_str(content)
            .map_err(|e| DomainError::configuration(format!("Invalid rule tables: {}", e)))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Rule tables shipped with the crate
    pub fn builtin() -> Result<Self, DomainError> {
        Self::from_toml_str(BUILTIN_RULES)
    }

    pub fn keywords_for(&self, domain: Domain) -> Option<&DomainKeywords> {
        match domain {
            Domain::Finance => Some(&self.classifier.finance),
            Domain::Medical => Some(&self.classifier.medical),
            Domain::CrossDomain | Domain::General => None,
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        for (name, table) in [
            ("finance", &self.classifier.finance),
            ("medical", &self.classifier.medical),
        ] {
            if let Some((term, weight)) = table
                .keywords
                .iter()
                .find(|(_, w)| !(0.0..=1.0).contains(*w))
            {
                return Err(DomainError::configuration(format!(
                    "{} keyword '{}' has weight {} outside [0, 1]",
                    name, term, weight
                )));
            }
            if table.patterns.iter().any(|p| !(0.0..=1.0).contains(&p.weight)) {
                return Err(DomainError::configuration(format!(
                    "{} pattern weight outside [0, 1]",
                    name
                )));
            }
        }

        let finance = &self.classifier.finance;
        let medical = &self.classifier.medical;
        if let Some(term) = finance
            .keywords
            .keys()
            .find(|k| medical.keywords.contains_key(*k))
        {
            return Err(DomainError::configuration(format!(
                "Keyword '{}' appears in both finance and medical tables",
                term
            )));
        }
        if let Some(term) = finance
            .strong_indicators
            .intersection(&medical.strong_indicators)
            .next()
        {
            return Err(DomainError::configuration(format!(
                "Strong indicator '{}' appears in both domains",
                term
            )));
        }

        let tiers = &self.safety.tier_scores;
        let ordered = (0.0..=1.0).contains(&tiers.high)
            && tiers.high <= tiers.medium
            && tiers.medium <= tiers.low
            && tiers.low < 1.0;
        if !ordered {
            return Err(DomainError::configuration(
                "Safety tier scores must satisfy 0 <= high <= medium <= low < 1",
            ));
        }

        if self.safety.crisis_response.trim().is_empty() {
            return Err(DomainError::configuration("Crisis response must not be empty"));
        }

        if self.evaluation.section_headers.is_empty() {
            return Err(DomainError::configuration(
                "At least one section header is required",
            ));
        }

        if !self.evaluation.expected_accuracy.all_within_unit()
            || !self.evaluation.faithfulness_domain_factor.all_within_unit()
        {
            return Err(DomainError::configuration(
                "Per-domain evaluation values must be within [0, 1]",
            ));
        }

        Ok(())
    }
}
