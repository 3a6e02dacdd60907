//! Query, classification and evaluation DTOs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
    BackendKind, BackendSpec, Classification, ClassificationReason, CompositeWeights, Domain,
    EvaluationResult, MetricName, MetricScore, PipelineNote, ResponseStatus,
};

#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    /// Registered model name; switches the active backend when it differs
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Per-metric values, one field per FAIR metric
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub faithfulness: f64,
    pub interpretability: f64,
    pub risk_awareness: f64,
    pub calibration: f64,
    pub robustness: f64,
    pub safety: f64,
}

impl MetricsSummary {
    fn from_result(result: &EvaluationResult) -> Self {
        let value = |name| result.metric(name).map(|m| m.value).unwrap_or(0.0);
        Self {
            faithfulness: value(MetricName::Faithfulness),
            interpretability: value(MetricName::Interpretability),
            risk_awareness: value(MetricName::RiskAwareness),
            calibration: value(MetricName::Calibration),
            robustness: value(MetricName::Robustness),
            safety: value(MetricName::Safety),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub query_id: String,
    pub status: ResponseStatus,
    pub response: String,
    pub metrics: MetricsSummary,
    pub composite: f64,
    pub domain: Domain,
    pub model_used: String,
    /// Seconds
    pub processing_time: f64,
    pub evidence_sources: Vec<String>,
    pub evidence_titles: Vec<String>,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<PipelineNote>,
    pub metric_details: BTreeMap<MetricName, MetricScore>,
}

impl QueryResponse {
    pub fn from_result(result: EvaluationResult, weights: &CompositeWeights) -> Self {
        let metrics = MetricsSummary::from_result(&result);
        let composite = result.composite(weights);
        let evidence_sources = result
            .response
            .evidence_ids()
            .into_iter()
            .map(str::to_string)
            .collect();
        let evidence_titles = result
            .response
            .evidence_titles()
            .into_iter()
            .map(str::to_string)
            .collect();
        let metric_details = result.metrics.into_iter().map(|m| (m.name, m)).collect();
        let response = result.response;

        Self {
            query_id: result.query_id,
            status: response.status,
            response: response.enhanced_text,
            metrics,
            composite,
            domain: response.domain,
            model_used: response.model_used,
            processing_time: result.processing_time_ms as f64 / 1000.0,
            evidence_sources,
            evidence_titles,
            confidence: response.confidence,
            notes: response.notes,
            metric_details,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyResponse {
    pub domain: Domain,
    pub confidence: f64,
    pub finance_score: f64,
    pub medical_score: f64,
    pub reason: ClassificationReason,
}

impl From<Classification> for ClassifyResponse {
    fn from(c: Classification) -> Self {
        Self {
            domain: c.domain,
            confidence: c.confidence,
            finance_score: c.finance_score,
            medical_score: c.medical_score,
            reason: c.reason,
        }
    }
}

/// Score a caller-supplied answer without generating one
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateRequest {
    pub query: String,
    pub answer: String,
    /// Classified from the query when omitted
    #[serde(default)]
    pub domain: Option<Domain>,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Replaces the generated robustness variants
    #[serde(default)]
    pub variants: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackendInfo {
    pub name: String,
    pub kind: BackendKind,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&BackendSpec> for BackendInfo {
    fn from(spec: &BackendSpec) -> Self {
        Self {
            name: spec.name.clone(),
            kind: spec.kind,
            model: spec.model.clone(),
            description: spec.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelsResponse {
    pub active: String,
    pub models: Vec<BackendInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconfigureRequest {
    pub model: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconfigureResponse {
    pub active: BackendInfo,
}
