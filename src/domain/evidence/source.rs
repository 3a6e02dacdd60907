//! Evidence source entities

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::text::tokenize;
use crate::domain::Domain;

/// A curated reference document with reliability metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceSource {
    pub id: String,
    pub title: String,
    pub body: String,
    pub source_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub domain: Domain,
    pub reliability_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<NaiveDate>,
    pub keywords: BTreeSet<String>,
    #[serde(skip)]
    keyword_tokens: BTreeSet<String>,
}

impl EvidenceSource {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        domain: Domain,
        reliability_score: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            source_type: "reference".to_string(),
            url: None,
            domain,
            reliability_score,
            publication_date: None,
            keywords: BTreeSet::new(),
            keyword_tokens: BTreeSet::new(),
        }
    }

    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = source_type.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_publication_date(mut self, date: NaiveDate) -> Self {
        self.publication_date = Some(date);
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords
            .into_iter()
            .map(|k| k.into().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self.keyword_tokens = self.keywords.iter().flat_map(|k| tokenize(k)).collect();
        self
    }

    /// Keywords split into single lowercase tokens, used for overlap scoring
    pub fn keyword_tokens(&self) -> &BTreeSet<String> {
        &self.keyword_tokens
    }

    /// Short excerpt of the body: the first sentence, bounded in length
    pub fn snippet(&self, max_chars: usize) -> String {
        let first = self
            .body
            .split_inclusive(". ")
            .next()
            .unwrap_or(&self.body)
            .trim();

        if first.chars().count() <= max_chars {
            first.to_string()
        } else {
            let truncated: String = first.chars().take(max_chars).collect();
            format!("{}...", truncated.trim_end())
        }
    }
}

/// A source paired with its relevance to a query; derived, never persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceMatch {
    pub source: Arc<EvidenceSource>,
    pub relevance_score: f64,
}

impl EvidenceMatch {
    pub fn new(source: Arc<EvidenceSource>, relevance_score: f64) -> Self {
        Self {
            source,
            relevance_score: relevance_score.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_tokens_split_phrases() {
        let source = EvidenceSource::new("med_001", "Aspirin", "Body.", Domain::Medical, 0.95)
            .with_keywords(["Aspirin", "side effects", "  "]);

        assert_eq!(source.keywords.len(), 2);
        assert!(source.keyword_tokens().contains("side"));
        assert!(source.keyword_tokens().contains("effects"));
        assert!(source.keyword_tokens().contains("aspirin"));
    }

    #[test]
    fn test_snippet_uses_first_sentence() {
        let source = EvidenceSource::new(
            "fin_001",
            "Diversification",
            "Diversification reduces risk. It does not remove it.",
            Domain::Finance,
            0.9,
        );
        assert_eq!(source.snippet(200), "Diversification reduces risk.");
        assert_eq!(source.snippet(10), "Diversific...");
    }

    #[test]
    fn test_match_clamps_relevance() {
        let source = Arc::new(EvidenceSource::new("x", "t", "b", Domain::Finance, 0.9));
        assert_eq!(EvidenceMatch::new(source, 1.5).relevance_score, 1.0);
    }
}
