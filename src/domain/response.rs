//! Agent response produced by the orchestrator

use serde::Serialize;

use super::evidence::EvidenceMatch;
use super::Domain;

/// Outcome of a query as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    /// A fallback answer replaced a failed synthesis
    Degraded,
    /// The query matched a harmful pattern and got the fixed crisis response
    SafetyIntervention,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Degraded => "degraded",
            Self::SafetyIntervention => "safety_intervention",
        }
    }
}

/// Conditions absorbed along the pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineNote {
    /// No domain cleared its threshold; answered as general
    ClassificationAmbiguous,
    EvidenceUnavailable { domain: Domain },
    SynthesisFallback { domain: Domain, reason: String },
    HarmfulQueryDetected { category: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentResponse {
    pub domain: Domain,
    pub raw_text: String,
    pub enhanced_text: String,
    pub evidence_used: Vec<EvidenceMatch>,
    pub confidence: f64,
    pub status: ResponseStatus,
    pub model_used: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<PipelineNote>,
}

impl AgentResponse {
    pub fn is_degraded(&self) -> bool {
        self.status == ResponseStatus::Degraded
    }

    pub fn evidence_ids(&self) -> Vec<&str> {
        self.evidence_used
            .iter()
            .map(|m| m.source.id.as_str())
            .collect()
    }

    pub fn evidence_titles(&self) -> Vec<&str> {
        self.evidence_used
            .iter()
            .map(|m| m.source.title.as_str())
            .collect()
    }
}
