use crate::domain::values::canonical_id::CanonicalId;
use crate::domain::values::confidence::Confidence;
use crate::domain::values::source::Source;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One incoming resolution request, as received from a composition batch:
/// a ticker and/or issuer name, an optional provider-supplied identifier,
/// and the holding's portfolio weight in percent (drives tiering).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionRequest {
    pub raw_ticker: String,
    pub raw_name: String,
    pub provider_id: Option<String>,
    pub weight: f64,
    pub context_id: Option<String>,
}

impl ResolutionRequest {
    pub fn new(ticker: impl Into<String>, name: impl Into<String>, weight: f64) -> Self {
        Self {
            raw_ticker: ticker.into(),
            raw_name: name.into(),
            provider_id: None,
            weight,
            context_id: None,
        }
    }

    pub fn with_provider_id(mut self, id: impl Into<String>) -> Self {
        self.provider_id = Some(id.into());
        self
    }

    pub fn with_context_id(mut self, id: impl Into<String>) -> Self {
        self.context_id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStatus {
    Resolved,
    Unresolved,
    /// Deliberately omitted by the tiering gate. Distinct from
    /// `Unresolved`: nothing failed and nothing is cached.
    Skipped,
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved => write!(f, "resolved"),
            Self::Unresolved => write!(f, "unresolved"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Outcome of one cascade run. `detail` names the step that decided the
/// outcome; `source` and `confidence` always reflect the earliest tier
/// that answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub resolved_id: Option<CanonicalId>,
    pub status: ResolutionStatus,
    pub detail: String,
    pub source: Option<Source>,
    pub confidence: Confidence,
}

impl ResolutionResult {
    pub fn resolved(
        id: CanonicalId,
        detail: impl Into<String>,
        source: Source,
        confidence: Confidence,
    ) -> Self {
        Self {
            resolved_id: Some(id),
            status: ResolutionStatus::Resolved,
            detail: detail.into(),
            source: Some(source),
            confidence,
        }
    }

    pub fn unresolved(detail: impl Into<String>) -> Self {
        Self {
            resolved_id: None,
            status: ResolutionStatus::Unresolved,
            detail: detail.into(),
            source: None,
            confidence: Confidence::default(),
        }
    }

    pub fn skipped(detail: impl Into<String>) -> Self {
        Self {
            resolved_id: None,
            status: ResolutionStatus::Skipped,
            detail: detail.into(),
            source: None,
            confidence: Confidence::default(),
        }
    }
}
