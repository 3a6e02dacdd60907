//! Query and domain types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DomainError;

/// Subject-matter category assigned to a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Finance,
    Medical,
    CrossDomain,
    General,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::Finance,
        Domain::Medical,
        Domain::CrossDomain,
        Domain::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finance => "finance",
            Self::Medical => "medical",
            Self::CrossDomain => "cross_domain",
            Self::General => "general",
        }
    }

    /// Finance and medical are the only domains with their own evidence and rules
    pub fn is_specialized(&self) -> bool {
        matches!(self, Self::Finance | Self::Medical)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "finance" | "financial" => Ok(Self::Finance),
            "medical" | "health" => Ok(Self::Medical),
            "cross_domain" | "cross-domain" | "crossdomain" => Ok(Self::CrossDomain),
            "general" => Ok(Self::General),
            other => Err(DomainError::validation(format!("Unknown domain '{}'", other))),
        }
    }
}

/// A free-text question, immutable once received
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    text: String,
    session_id: String,
}

impl Query {
    pub fn new(text: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session_id: session_id.into(),
        }
    }

    /// Create a query with a freshly generated session id
    pub fn anonymous(text: impl Into<String>) -> Self {
        Self::new(text, Uuid::new_v4().to_string())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
