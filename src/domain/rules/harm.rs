//! Harmful-content patterns and severity tiers

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Severity tier of a harmful-content pattern, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarmTier {
    Low,
    Medium,
    High,
}

impl HarmTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct HarmPatternSpec {
    pattern: String,
    tier: HarmTier,
    category: String,
}

/// A compiled harmful-content pattern
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "HarmPatternSpec")]
pub struct HarmPattern {
    regex: Regex,
    tier: HarmTier,
    category: String,
}

impl TryFrom<HarmPatternSpec> for HarmPattern {
    type Error = regex::Error;

    fn try_from(spec: HarmPatternSpec) -> Result<Self, Self::Error> {
        let regex = RegexBuilder::new(&spec.pattern)
            .case_insensitive(true)
            .build()?;

        Ok(Self {
            regex,
            tier: spec.tier,
            category: spec.category,
        })
    }
}

impl HarmPattern {
    pub fn tier(&self) -> HarmTier {
        self.tier
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// The most severe pattern that matched a text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarmMatch {
    pub tier: HarmTier,
    pub category: String,
    pub matches: usize,
}

/// Scan text against the patterns and report the most severe tier matched
pub fn scan(patterns: &[HarmPattern], text: &str) -> Option<HarmMatch> {
    let mut worst: Option<&HarmPattern> = None;
    let mut matches = 0;

    for pattern in patterns.iter().filter(|p| p.is_match(text)) {
        matches += 1;
        if worst.is_none_or(|w| pattern.tier > w.tier) {
            worst = Some(pattern);
        }
    }

    worst.map(|pattern| HarmMatch {
        tier: pattern.tier,
        category: pattern.category.clone(),
        matches,
    })
}
