//! Metric names and scores

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The six FAIR dimensions, in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    Faithfulness,
    Interpretability,
    RiskAwareness,
    Calibration,
    Robustness,
    Safety,
}

impl MetricName {
    pub const ALL: [MetricName; 6] = [
        MetricName::Faithfulness,
        MetricName::Interpretability,
        MetricName::RiskAwareness,
        MetricName::Calibration,
        MetricName::Robustness,
        MetricName::Safety,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Faithfulness => "faithfulness",
            Self::Interpretability => "interpretability",
            Self::RiskAwareness => "risk_awareness",
            Self::Calibration => "calibration",
            Self::Robustness => "robustness",
            Self::Safety => "safety",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bounded score with the components that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricScore {
    pub name: MetricName,
    pub value: f64,
    pub breakdown: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MetricScore {
    /// Value is clipped to [0, 1]; NaN becomes 0
    pub fn new(name: MetricName, value: f64) -> Self {
        Self {
            name,
            value: unit(value),
            breakdown: BTreeMap::new(),
            error: None,
        }
    }

    /// Zeroed score for a scorer that failed
    pub fn failed(name: MetricName, message: impl Into<String>) -> Self {
        let mut score = Self::new(name, 0.0);
        score.breakdown.insert("error".to_string(), 1.0);
        score.error = Some(message.into());
        score
    }

    pub fn with_component(mut self, key: impl Into<String>, value: f64) -> Self {
        let value = if value.is_finite() { value } else { 0.0 };
        self.breakdown.insert(key.into(), value);
        self
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

pub(crate) fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
