//! Evidence catalog, store and retrieval

mod catalog;
mod retriever;
mod source;
mod store;

pub use catalog::{
    CatalogDocument, CatalogEntry, CatalogLoadReport, CatalogMetadata, QualityThresholds,
    RejectedEntry,
};
pub use retriever::{EvidenceRetriever, DEFAULT_TOP_K};
pub use source::{EvidenceMatch, EvidenceSource};
pub use store::{EvidenceProvider, EvidenceStore};
