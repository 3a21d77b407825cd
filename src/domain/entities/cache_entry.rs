use crate::domain::values::alias_type::AliasType;
use crate::domain::values::canonical_id::CanonicalId;
use crate::domain::values::confidence::Confidence;
use crate::domain::values::source::Source;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStatus {
    Resolved,
    Unresolved,
    RateLimited,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved => write!(f, "resolved"),
            Self::Unresolved => write!(f, "unresolved"),
            Self::RateLimited => write!(f, "rate-limited"),
        }
    }
}

impl FromStr for CacheStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "resolved" => Ok(Self::Resolved),
            "unresolved" => Ok(Self::Unresolved),
            "rate-limited" | "rate_limited" => Ok(Self::RateLimited),
            _ => Err(format!("Invalid cache status: '{s}'")),
        }
    }
}

/// Unified positive/negative resolution cache record.
///
/// Invariant: `Resolved` entries carry an identifier and never expire;
/// `Unresolved`/`RateLimited` entries carry no identifier and always
/// expire. The constructors are the only way the engine builds entries,
/// so the invariant holds by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionCacheEntry {
    pub alias_key: String,
    pub alias_kind: AliasType,
    pub resolved_id: Option<CanonicalId>,
    pub status: CacheStatus,
    pub confidence: Confidence,
    pub source: Option<Source>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ResolutionCacheEntry {
    /// Never-expiring positive entry.
    pub fn positive(
        key: &str,
        kind: AliasType,
        id: CanonicalId,
        confidence: Confidence,
        source: Source,
    ) -> Self {
        Self {
            alias_key: key.trim().to_uppercase(),
            alias_kind: kind,
            resolved_id: Some(id),
            status: CacheStatus::Resolved,
            confidence,
            source: Some(source),
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Expiring negative entry; `status` distinguishes a genuine miss from
    /// a rate-limit backoff so callers can pick the TTL accordingly.
    pub fn negative(key: &str, kind: AliasType, status: CacheStatus, ttl: Duration) -> Self {
        debug_assert!(status != CacheStatus::Resolved);
        let now = Utc::now();
        Self {
            alias_key: key.trim().to_uppercase(),
            alias_kind: kind,
            resolved_id: None,
            status,
            confidence: Confidence::default(),
            source: None,
            created_at: now,
            expires_at: Some(now + ttl),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == CacheStatus::Resolved
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}
