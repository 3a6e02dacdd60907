//! Read-only evidence store

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{info, warn};

use super::catalog::{
    CatalogDocument, CatalogLoadReport, CatalogMetadata, QualityThresholds, RejectedEntry,
};
use super::EvidenceSource;
use crate::domain::{Domain, DomainError};

const BUILTIN_CATALOG: &str = include_str!("../../../data/evidence_catalog.json");

/// Supplies candidate evidence for a domain
///
/// The static store implements this; a live provider can stand behind the
/// same interface.
pub trait EvidenceProvider: Send + Sync + std::fmt::Debug {
    /// Entries tagged with the domain. Cross-domain yields both specialized domains.
    fn candidates(&self, domain: Domain) -> Vec<Arc<EvidenceSource>>;

    /// Upper bound on sources returned for a single query
    fn max_sources_per_query(&self) -> usize;
}

/// Evidence catalog loaded once at startup, never mutated afterwards
#[derive(Debug, Clone)]
pub struct EvidenceStore {
    metadata: CatalogMetadata,
    thresholds: QualityThresholds,
    by_domain: HashMap<Domain, Vec<Arc<EvidenceSource>>>,
    report: CatalogLoadReport,
}

impl EvidenceStore {
    /// Store with no sources; retrieval always yields no evidence
    pub fn empty() -> Self {
        Self {
            metadata: CatalogMetadata {
                version: "empty".to_string(),
                last_updated: None,
                total_sources: Some(0),
            },
            thresholds: QualityThresholds::default(),
            by_domain: HashMap::new(),
            report: CatalogLoadReport::default(),
        }
    }

    /// Build the store from a parsed catalog, rejecting entries that fail quality checks
    pub fn from_document(document: CatalogDocument) -> Self {
        let CatalogDocument {
            metadata,
            quality_thresholds: thresholds,
            sources,
        } = document;

        let mut by_domain: HashMap<Domain, Vec<Arc<EvidenceSource>>> = HashMap::new();
        let mut seen = HashSet::new();
        let mut report = CatalogLoadReport {
            version: metadata.version.clone(),
            declared_total: metadata.total_sources,
            ..Default::default()
        };

        for (section, entries) in sources {
            for entry in entries {
                let id = entry.id.clone();
                if !seen.insert(id.clone()) {
                    report.rejected.push(RejectedEntry {
                        id,
                        reason: "duplicate id".to_string(),
                    });
                    continue;
                }

                match entry.into_source(&section, &thresholds) {
                    Ok(source) => {
                        report.accepted += 1;
                        by_domain
                            .entry(source.domain)
                            .or_default()
                            .push(Arc::new(source));
                    }
                    Err(reason) => report.rejected.push(RejectedEntry { id, reason }),
                }
            }
        }

        for rejected in &report.rejected {
            warn!(id = %rejected.id, reason = %rejected.reason, "Rejected evidence entry");
        }
        if report.total_mismatch() {
            warn!(
                declared = ?report.declared_total,
                found = report.accepted + report.rejected.len(),
                "Evidence catalog total_sources does not match entries"
            );
        }

        info!(
            version = %metadata.version,
            accepted = report.accepted,
            rejected = report.rejected.len(),
            "Evidence store loaded"
        );

        Self {
            metadata,
            thresholds,
            by_domain,
            report,
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, DomainError> {
        Ok(Self::from_document(CatalogDocument::from_json_str(content)?))
    }

    /// Catalog shipped with the crate
    pub fn builtin() -> Result<Self, DomainError> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    pub fn metadata(&self) -> &CatalogMetadata {
        &self.metadata
    }

    pub fn thresholds(&self) -> &QualityThresholds {
        &self.thresholds
    }

    pub fn load_report(&self) -> &CatalogLoadReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.by_domain.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<Arc<EvidenceSource>> {
        self.by_domain
            .values()
            .flatten()
            .find(|s| s.id == id)
            .cloned()
    }

    fn tagged(&self, domain: Domain) -> impl Iterator<Item = &Arc<EvidenceSource>> {
        self.by_domain.get(&domain).into_iter().flatten()
    }
}

impl EvidenceProvider for EvidenceStore {
    fn candidates(&self, domain: Domain) -> Vec<Arc<EvidenceSource>> {
        match domain {
            Domain::CrossDomain => self
                .tagged(Domain::Finance)
                .chain(self.tagged(Domain::Medical))
                .cloned()
                .collect(),
            other => self.tagged(other).cloned().collect(),
        }
    }

    fn max_sources_per_query(&self) -> usize {
        self.thresholds.max_sources_per_query
    }
}
