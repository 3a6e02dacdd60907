//! Loading of the versioned rule tables and evidence catalog

use std::path::Path;

use tracing::{info, warn};

use crate::config::DataConfig;
use crate::domain::evidence::EvidenceStore;
use crate::domain::rules::RuleTables;
use crate::domain::DomainError;

/// Rule tables from `path`, or the built-in copy when no path is configured
///
/// A configured file that is missing falls back to the built-in tables; one
/// that exists but fails to parse or validate is a startup error.
pub fn load_rules(path: Option<&Path>) -> Result<RuleTables, DomainError> {
    let Some(path) = path else {
        return RuleTables::builtin();
    };

    match std::fs::read_to_string(path) {
        Ok(content) => {
            let rules = RuleTables::from_toml_str(&content)?;
            info!(path = %path.display(), version = %rules.version, "Loaded rule tables");
            Ok(rules)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Rule file unreadable, using built-in rules");
            RuleTables::builtin()
        }
    }
}

/// Evidence catalog from `path`, or the built-in copy; same fallback policy as the rules
pub fn load_evidence(path: Option<&Path>) -> Result<EvidenceStore, DomainError> {
    let Some(path) = path else {
        return EvidenceStore::builtin();
    };

    match std::fs::read_to_string(path) {
        Ok(content) => {
            let store = EvidenceStore::from_json_str(&content)?;
            info!(path = %path.display(), sources = store.len(), "Loaded evidence catalog");
            Ok(store)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Catalog unreadable, using built-in catalog");
            EvidenceStore::builtin()
        }
    }
}

pub fn load_all(config: &DataConfig) -> Result<(RuleTables, EvidenceStore), DomainError> {
    let rules = load_rules(config.rules.as_deref())?;
    let store = load_evidence(config.evidence_catalog.as_deref())?;
    Ok((rules, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path =
            std::env::temp_dir().join(format!("fair-agent-{}-{}", uuid::Uuid::new_v4(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_to_builtin() {
        let (rules, store) = load_all(&DataConfig::default()).unwrap();
        assert_eq!(rules.version, RuleTables::builtin().unwrap().version);
        assert_eq!(store.len(), 11);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let missing = Path::new("/nonexistent/fair-agent/rules.toml");
        assert!(load_rules(Some(missing)).is_ok());
        assert!(load_evidence(Some(Path::new("/nonexistent/catalog.json"))).is_ok());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let path = temp_file("rules.toml", "version = 1\n[broken");
        assert!(load_rules(Some(&path)).is_err());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_custom_catalog_loaded() {
        let catalog = r#"{
            "metadata": { "version": "t", "last_updated": "2024-01-01", "total_sources": 1 },
            "quality_thresholds": { "min_reliability": 0.5, "max_sources_per_query": 2 },
            "sources": { "medical": [{
                "id": "m1", "title": "T", "content": "Body.", "source_type": "guide",
                "url": "https://example.org", "publication_date": "2024-01-01",
                "reliability_score": 0.9, "domain": "medical", "keywords": ["aspirin"]
            }] }
        }"#;
        let path = temp_file("catalog.json", catalog);

        let store = load_evidence(Some(&path)).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get("m1").is_some());
        std::fs::remove_file(path).ok();
    }
}
