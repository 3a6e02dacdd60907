//! Keyword-overlap evidence retrieval

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use super::{EvidenceMatch, EvidenceProvider};
use crate::domain::rules::RuleTables;
use crate::domain::text::content_tokens;
use crate::domain::Domain;

pub const DEFAULT_TOP_K: usize = 3;

/// Ranks candidate evidence by overlap between query tokens and entry keywords
#[derive(Debug, Clone)]
pub struct EvidenceRetriever {
    provider: Arc<dyn EvidenceProvider>,
    rules: Arc<RuleTables>,
}

impl EvidenceRetriever {
    pub fn new(provider: Arc<dyn EvidenceProvider>, rules: Arc<RuleTables>) -> Self {
        Self { provider, rules }
    }

    /// Number of sources the provider can offer across both specialized domains
    pub fn source_count(&self) -> usize {
        self.provider.candidates(Domain::CrossDomain).len()
    }

    /// Top matches for the query, highest relevance first
    ///
    /// Ties break on reliability, then publication date (newer first, undated
    /// last), then id. Entries with zero relevance are never returned and the
    /// result holds at most `min(top_k, max_sources_per_query)` entries.
    pub fn retrieve(&self, query: &str, domain: Domain, top_k: usize) -> Vec<EvidenceMatch> {
        let query_tokens: BTreeSet<String> =
            content_tokens(query, &self.rules.stopwords).into_iter().collect();
        let limit = top_k.min(self.provider.max_sources_per_query());

        if query_tokens.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut matches: Vec<EvidenceMatch> = self
            .provider
            .candidates(domain)
            .into_iter()
            .filter_map(|source| {
                let overlap = query_tokens.intersection(source.keyword_tokens()).count();
                (overlap > 0).then(|| {
                    EvidenceMatch::new(source, overlap as f64 / query_tokens.len() as f64)
                })
            })
            .collect();

        matches.sort_by(rank);
        matches.truncate(limit);

        debug!(
            domain = %domain,
            candidates_matched = matches.len(),
            "Evidence retrieved"
        );

        matches
    }
}

fn rank(a: &EvidenceMatch, b: &EvidenceMatch) -> Ordering {
    b.relevance_score
        .total_cmp(&a.relevance_score)
        .then_with(|| b.source.reliability_score.total_cmp(&a.source.reliability_score))
        .then_with(|| match (a.source.publication_date, b.source.publication_date) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.source.id.cmp(&b.source.id))
}
