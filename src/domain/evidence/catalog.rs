//! Evidence catalog document format

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::EvidenceSource;
use crate::domain::{Domain, DomainError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogMetadata {
    pub version: String,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub total_sources: Option<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualityThresholds {
    #[serde(default = "default_min_reliability")]
    pub min_reliability: f64,
    #[serde(default = "default_max_sources_per_query")]
    pub max_sources_per_query: usize,
}

fn default_min_reliability() -> f64 {
    0.7
}

fn default_max_sources_per_query() -> usize {
    5
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_reliability: default_min_reliability(),
            max_sources_per_query: default_max_sources_per_query(),
        }
    }
}

/// A catalog entry as it appears on disk
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default = "default_source_type")]
    pub source_type: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub publication_date: Option<String>,
    pub reliability_score: f64,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_source_type() -> String {
    "reference".to_string()
}

/// The whole catalog document: metadata, thresholds and entries grouped by domain
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogDocument {
    pub metadata: CatalogMetadata,
    #[serde(default)]
    pub quality_thresholds: QualityThresholds,
    pub sources: BTreeMap<String, Vec<CatalogEntry>>,
}

impl CatalogDocument {
    pub fn from_json_str(content: &str) -> Result<Self, DomainError> {
        serde_json::from_str(content)
            .map_err(|e| DomainError::catalog(format!("Invalid evidence catalog: {}", e)))
    }
}

/// An entry that did not make it into the store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedEntry {
    pub id: String,
    pub reason: String,
}

/// Outcome of loading a catalog
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogLoadReport {
    pub version: String,
    pub accepted: usize,
    pub rejected: Vec<RejectedEntry>,
    pub declared_total: Option<usize>,
}

impl CatalogLoadReport {
    /// Whether the declared `total_sources` disagrees with the entries present
    pub fn total_mismatch(&self) -> bool {
        self.declared_total
            .is_some_and(|declared| declared != self.accepted + self.rejected.len())
    }
}

impl CatalogEntry {
    /// Validate and convert into a source; `section` is the domain key the entry was listed under
    pub fn into_source(
        self,
        section: &str,
        thresholds: &QualityThresholds,
    ) -> Result<EvidenceSource, String> {
        if self.id.trim().is_empty() {
            return Err("empty id".to_string());
        }

        if !(0.0..=1.0).contains(&self.reliability_score) {
            return Err(format!(
                "reliability {} outside [0, 1]",
                self.reliability_score
            ));
        }

        if self.reliability_score < thresholds.min_reliability {
            return Err(format!(
                "reliability {} below minimum {}",
                self.reliability_score, thresholds.min_reliability
            ));
        }

        let domain_name = self.domain.as_deref().unwrap_or(section);
        let domain: Domain = domain_name.parse().map_err(|e: DomainError| e.to_string())?;
        if !domain.is_specialized() {
            return Err(format!("domain '{}' cannot hold evidence", domain));
        }

        let publication_date = match self.publication_date.as_deref() {
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| format!("invalid publication date '{}'", raw))?,
            ),
            None => None,
        };

        let mut source = EvidenceSource::new(
            self.id,
            self.title,
            self.content.trim(),
            domain,
            self.reliability_score,
        )
        .with_source_type(self.source_type)
        .with_keywords(self.keywords);

        if let Some(url) = self.url {
            source = source.with_url(url);
        }
        if let Some(date) = publication_date {
            source = source.with_publication_date(date);
        }

        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, reliability: f64) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            title: "Title".to_string(),
            content: " Body text. ".to_string(),
            source_type: "guideline".to_string(),
            url: None,
            publication_date: Some("2023-08-01".to_string()),
            reliability_score: reliability,
            domain: None,
            keywords: vec!["retirement".to_string()],
        }
    }

    #[test]
    fn test_entry_takes_domain_from_section() {
        let source = entry("fin_004", 0.92)
            .into_source("finance", &QualityThresholds::default())
            .unwrap();
        assert_eq!(source.domain, Domain::Finance);
        assert_eq!(source.body, "Body text.");
        assert_eq!(
            source.publication_date,
            NaiveDate::from_ymd_opt(2023, 8, 1)
        );
    }

    #[test]
    fn test_entry_below_min_reliability_rejected() {
        let err = entry("weak", 0.5)
            .into_source("finance", &QualityThresholds::default())
            .unwrap_err();
        assert!(err.contains("below minimum"));
    }

    #[test]
    fn test_entry_out_of_range_rejected() {
        assert!(entry("bad", 1.2)
            .into_source("medical", &QualityThresholds::default())
            .is_err());
    }

    #[test]
    fn test_entry_general_domain_rejected() {
        assert!(entry("gen", 0.9)
            .into_source("general", &QualityThresholds::default())
            .is_err());
    }

    #[test]
    fn test_entry_bad_date_rejected() {
        let mut e = entry("date", 0.9);
        e.publication_date = Some("last spring".to_string());
        assert!(e
            .into_source("medical", &QualityThresholds::default())
            .is_err());
    }
}
