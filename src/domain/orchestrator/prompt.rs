//! Prompt construction for the generation backend

use crate::domain::evidence::EvidenceMatch;
use crate::domain::llm::SynthesisPrompt;
use crate::domain::rules::RuleTables;
use crate::domain::Domain;

/// Numbered evidence block; numbering starts after `offset` so merged branches line up
pub fn format_evidence(evidence: &[EvidenceMatch], offset: usize) -> String {
    evidence
        .iter()
        .enumerate()
        .map(|(i, m)| {
            format!(
                "[Source {}] {}\nReliability: {:.2}\n{}",
                offset + i + 1,
                m.source.title,
                m.source.reliability_score,
                m.source.body
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(
    rules: &RuleTables,
    domain: Domain,
    query: &str,
    evidence: &[EvidenceMatch],
    offset: usize,
) -> SynthesisPrompt {
    let system = rules.prompts.for_domain(domain);

    let user = if evidence.is_empty() {
        format!("Question: {}", query)
    } else {
        format!(
            "Question: {}\n\nEvidence:\n{}\n\n\
             Answer using the evidence above. Cite the sources you rely on with their \
             bracketed numbers, for example [Source {}]. If the evidence does not cover \
             the question, say so.",
            query,
            format_evidence(evidence, offset),
            offset + 1
        )
    };

    SynthesisPrompt::new(system, user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evidence::EvidenceSource;
    use std::sync::Arc;

    #[test]
    fn test_prompt_numbers_evidence_from_offset() {
        let rules = RuleTables::builtin().unwrap();
        let source = EvidenceSource::new("m1", "Aspirin", "Body text.", Domain::Medical, 0.95);
        let evidence = vec![EvidenceMatch::new(Arc::new(source), 1.0)];

        let prompt = build_prompt(&rules, Domain::Medical, "aspirin?", &evidence, 2);

        assert_eq!(prompt.system, rules.prompts.medical);
        assert!(prompt.user.contains("[Source 3] Aspirin"));
        assert!(prompt.user.contains("Reliability: 0.95"));
    }

    #[test]
    fn test_prompt_without_evidence() {
        let rules = RuleTables::builtin().unwrap();
        let prompt = build_prompt(&rules, Domain::General, "hi", &[], 0);
        assert_eq!(prompt.user, "Question: hi");
        assert_eq!(prompt.system, rules.prompts.general);
    }
}
