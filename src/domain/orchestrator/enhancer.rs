//! Deterministic post-processing of generated answers

use std::sync::Arc;

use crate::domain::evidence::EvidenceMatch;
use crate::domain::rules::RuleTables;
use crate::domain::text::{contains_phrase, has_step_markers, split_sentences, tokenize};
use crate::domain::Domain;

/// Upper bound on `Step N:` lines emitted for an unstructured answer
pub const MAX_STEPS: usize = 5;

const SNIPPET_CHARS: usize = 160;
const DISCLAIMER_SEPARATOR: &str = "\n\n---\n";

#[derive(Debug, Clone)]
pub struct ResponseEnhancer {
    rules: Arc<RuleTables>,
}

impl ResponseEnhancer {
    pub fn new(rules: Arc<RuleTables>) -> Self {
        Self { rules }
    }

    /// Adds step markers to an answer that has none. Short answers are left alone.
    pub fn structure(&self, raw: &str) -> String {
        let raw = raw.trim();
        if has_step_markers(raw) {
            return raw.to_string();
        }

        let sentences = split_sentences(raw);
        if sentences.len() < 2 {
            return raw.to_string();
        }

        let mut out = String::from("**Analysis**\n");
        for (i, sentence) in sentences.iter().take(MAX_STEPS).enumerate() {
            let sentence = sentence.trim_start_matches(['-', '*', '•', ' ']);
            out.push_str(&format!("Step {}: {}\n", i + 1, sentence));
        }

        if sentences.len() > MAX_STEPS {
            out.push_str("\n**Conclusion**\n");
            out.push_str(&sentences[MAX_STEPS..].join(" "));
            out.push('\n');
        }

        out.trim_end().to_string()
    }

    /// References numbered from `offset + 1`, matching the prompt's `[Source N]` markers
    pub fn evidence_section(&self, evidence: &[EvidenceMatch], offset: usize) -> Option<String> {
        if evidence.is_empty() {
            return None;
        }

        let lines: Vec<String> = evidence
            .iter()
            .enumerate()
            .map(|(i, m)| {
                format!(
                    "[{}] {} (reliability {:.2}): {}",
                    offset + i + 1,
                    m.source.title,
                    m.source.reliability_score,
                    m.source.snippet(SNIPPET_CHARS)
                )
            })
            .collect();

        Some(format!("**Evidence**\n{}", lines.join("\n")))
    }

    /// Structure plus references for a single domain branch
    pub fn enhance_branch(&self, raw: &str, evidence: &[EvidenceMatch], offset: usize) -> String {
        let structured = self.structure(raw);
        match self.evidence_section(evidence, offset) {
            Some(section) => format!("{}\n\n{}", structured, section),
            None => structured,
        }
    }

    /// Disclaimers for the given branch domains, in display order
    ///
    /// A branch always gets its own domain disclaimer; the other specialized
    /// domain's disclaimer is added when one of its strong indicators shows up.
    pub fn disclaimers(&self, query: &str, answer: &str, domains: &[Domain]) -> Vec<String> {
        let specialized: Vec<Domain> = domains
            .iter()
            .copied()
            .filter(Domain::is_specialized)
            .collect();
        if specialized.is_empty() {
            return Vec::new();
        }

        let rules = &self.rules.disclaimers;
        let combined = tokenize(&format!("{} {}", query, answer));
        let triggered = |domain: Domain| {
            specialized.contains(&domain)
                || self.rules.keywords_for(domain).is_some_and(|k| {
                    k.strong_indicators
                        .iter()
                        .any(|term| contains_phrase(&combined, term))
                })
        };

        let mut out = Vec::new();
        if triggered(Domain::Medical) {
            out.push(rules.medical.clone());
        }
        if triggered(Domain::Finance) {
            out.push(rules.financial.clone());
        }
        if rules
            .emergency_triggers
            .iter()
            .any(|t| contains_phrase(&combined, t))
        {
            out.push(rules.emergency.clone());
        }

        let query_tokens = tokenize(query);
        if rules
            .advisory_indicators
            .iter()
            .any(|t| contains_phrase(&query_tokens, t))
        {
            out.push(rules.professional.clone());
        }

        out
    }
}

pub fn append_disclaimers(text: &str, disclaimers: &[String]) -> String {
    if disclaimers.is_empty() {
        return text.to_string();
    }
    format!(
        "{}{}{}",
        text.trim_end(),
        DISCLAIMER_SEPARATOR,
        disclaimers.join("\n\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evidence::EvidenceSource;

    fn enhancer() -> ResponseEnhancer {
        ResponseEnhancer::new(Arc::new(RuleTables::builtin().unwrap()))
    }

    #[test]
    fn test_structure_adds_steps() {
        let out = enhancer().structure("Save early. Diversify widely. Review yearly.");
        assert!(out.starts_with("**Analysis**\nStep 1: Save early."));
        assert!(out.contains("Step 3: Review yearly."));
        assert!(has_step_markers(&out));
    }

    #[test]
    fn test_structure_bounds_steps() {
        let raw = "One. Two. Three. Four. Five. Six. Seven.";
        let out = enhancer().structure(raw);
        assert!(out.contains("Step 5: Five."));
        assert!(!out.contains("Step 6"));
        assert!(out.contains("**Conclusion**\nSix. Seven."));
    }

    #[test]
    fn test_structure_keeps_existing_markers_and_short_text() {
        let e = enhancer();
        assert_eq!(e.structure("1. First\n2. Second"), "1. First\n2. Second");
        assert_eq!(e.structure("Just one sentence."), "Just one sentence.");
    }

    #[test]
    fn test_evidence_section_numbering() {
        let source = EvidenceSource::new(
            "m1",
            "Aspirin",
            "Aspirin thins blood. More.",
            Domain::Medical,
            0.95,
        );
        let evidence = vec![EvidenceMatch::new(Arc::new(source), 1.0)];
        let section = enhancer().evidence_section(&evidence, 3).unwrap();
        assert_eq!(
            section,
            "**Evidence**\n[4] Aspirin (reliability 0.95): Aspirin thins blood."
        );
        assert!(enhancer().evidence_section(&[], 0).is_none());
    }

    #[test]
    fn test_branch_disclaimer_always_present() {
        let rules = RuleTables::builtin().unwrap();
        let out = enhancer().disclaimers("aspirin dose", "Take with food.", &[Domain::Medical]);
        assert_eq!(out, vec![rules.disclaimers.medical.clone()]);
    }

    #[test]
    fn test_emergency_and_advisory_disclaimers() {
        let rules = RuleTables::builtin().unwrap();
        let out = enhancer().disclaimers(
            "Should I invest while having chest pain?",
            "",
            &[Domain::Finance],
        );
        assert!(out.contains(&rules.disclaimers.financial));
        assert!(out.contains(&rules.disclaimers.emergency));
        assert!(out.contains(&rules.disclaimers.professional));
    }

    #[test]
    fn test_general_gets_no_disclaimers() {
        assert!(enhancer()
            .disclaimers("chest pain emergency", "", &[Domain::General])
            .is_empty());
    }

    #[test]
    fn test_append_disclaimers() {
        let text = append_disclaimers("Answer.\n", &["A".to_string(), "B".to_string()]);
        assert_eq!(text, "Answer.\n\n---\nA\n\nB");
        assert_eq!(append_disclaimers("Answer.", &[]), "Answer.");
    }
}
