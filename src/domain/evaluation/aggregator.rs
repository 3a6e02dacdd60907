//! Combines metric scores into a reportable result

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{MetricName, MetricScore};
use crate::domain::response::AgentResponse;

/// Per-metric weights for an optional headline number
///
/// Defaults to equal weights. Callers can re-weight without re-running scorers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeWeights {
    #[serde(default = "one")]
    pub faithfulness: f64,
    #[serde(default = "one")]
    pub interpretability: f64,
    #[serde(default = "one")]
    pub risk_awareness: f64,
    #[serde(default = "one")]
    pub calibration: f64,
    #[serde(default = "one")]
    pub robustness: f64,
    #[serde(default = "one")]
    pub safety: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            faithfulness: one(),
            interpretability: one(),
            risk_awareness: one(),
            calibration: one(),
            robustness: one(),
            safety: one(),
        }
    }
}

impl CompositeWeights {
    pub fn weight(&self, name: MetricName) -> f64 {
        let w = match name {
            MetricName::Faithfulness => self.faithfulness,
            MetricName::Interpretability => self.interpretability,
            MetricName::RiskAwareness => self.risk_awareness,
            MetricName::Calibration => self.calibration,
            MetricName::Robustness => self.robustness,
            MetricName::Safety => self.safety,
        };
        if w.is_finite() { w.max(0.0) } else { 0.0 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub query_id: String,
    pub response: AgentResponse,
    pub metrics: Vec<MetricScore>,
    pub processing_time_ms: u64,
}

impl EvaluationResult {
    pub fn metric(&self, name: MetricName) -> Option<&MetricScore> {
        self.metrics.iter().find(|m| m.name == name)
    }

    pub fn metric_values(&self) -> BTreeMap<MetricName, f64> {
        self.metrics.iter().map(|m| (m.name, m.value)).collect()
    }

    pub fn failed_metrics(&self) -> impl Iterator<Item = &MetricScore> {
        self.metrics.iter().filter(|m| m.is_failed())
    }

    /// Weighted mean of the metric values; failed scorers count as 0
    pub fn composite(&self, weights: &CompositeWeights) -> f64 {
        let (sum, total) = self.metrics.iter().fold((0.0, 0.0), |(sum, total), m| {
            let w = weights.weight(m.name);
            (sum + w * m.value, total + w)
        });

        if total > 0.0 { (sum / total).clamp(0.0, 1.0) } else { 0.0 }
    }
}

/// Preserves every named score in reporting order
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator;

impl Aggregator {
    /// One score per metric, in `MetricName::ALL` order; missing metrics are recorded as failed
    pub fn aggregate(
        &self,
        query_id: impl Into<String>,
        response: AgentResponse,
        scores: Vec<MetricScore>,
        elapsed: Duration,
    ) -> EvaluationResult {
        let mut by_name: BTreeMap<MetricName, MetricScore> = BTreeMap::new();
        for score in scores {
            by_name.entry(score.name).or_insert(score);
        }

        let metrics = MetricName::ALL
            .iter()
            .map(|name| {
                by_name
                    .remove(name)
                    .unwrap_or_else(|| MetricScore::failed(*name, "metric was not computed"))
            })
            .collect();

        EvaluationResult {
            query_id: query_id.into(),
            response,
            metrics,
            processing_time_ms: elapsed.as_millis().min(u64::MAX as u128) as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::response::ResponseStatus;
    use crate::domain::Domain;

    fn response() -> AgentResponse {
        AgentResponse {
            domain: Domain::General,
            raw_text: "raw".to_string(),
            enhanced_text: "enhanced".to_string(),
            evidence_used: vec![],
            confidence: 0.3,
            status: ResponseStatus::Success,
            model_used: "test".to_string(),
            notes: vec![],
        }
    }

    fn result(values: &[(MetricName, f64)]) -> EvaluationResult {
        let scores = values
            .iter()
            .map(|(name, value)| MetricScore::new(*name, *value))
            .collect();
        Aggregator.aggregate("q-1", response(), scores, Duration::from_millis(12))
    }

    #[test]
    fn test_orders_and_fills_metrics() {
        let result = result(&[(MetricName::Safety, 1.0), (MetricName::Faithfulness, 0.4)]);
        let names: Vec<MetricName> = result.metrics.iter().map(|m| m.name).collect();

        assert_eq!(names, MetricName::ALL.to_vec());
        assert_eq!(result.metric(MetricName::Faithfulness).unwrap().value, 0.4);
        assert!(result.metric(MetricName::Robustness).unwrap().is_failed());
        assert_eq!(result.failed_metrics().count(), 4);
        assert_eq!(result.processing_time_ms, 12);
    }

    #[test]
    fn test_equal_weight_composite() {
        let values: Vec<(MetricName, f64)> = MetricName::ALL
            .iter()
            .zip([0.6, 0.0, 0.3, 0.9, 1.0, 1.0])
            .map(|(n, v)| (*n, v))
            .collect();
        let result = result(&values);
        assert!((result.composite(&CompositeWeights::default()) - 0.633333).abs() < 1e-5);
    }

    #[test]
    fn test_reweighted_composite() {
        let result = result(&[(MetricName::Safety, 1.0), (MetricName::Faithfulness, 0.0)]);
        let weights = CompositeWeights {
            faithfulness: 0.0,
            interpretability: 0.0,
            risk_awareness: 0.0,
            calibration: 0.0,
            robustness: 0.0,
            safety: 2.0,
        };
        assert_eq!(result.composite(&weights), 1.0);

        let zero = CompositeWeights {
            safety: 0.0,
            ..weights
        };
        assert_eq!(result.composite(&zero), 0.0);
    }

    #[test]
    fn test_duplicate_scores_keep_first() {
        let result = result(&[(MetricName::Safety, 1.0), (MetricName::Safety, 0.0)]);
        assert_eq!(result.metric(MetricName::Safety).unwrap().value, 1.0);
    }
}
