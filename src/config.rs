use crate::domain::error::EngineError;
use crate::domain::values::canonical_id::CanonicalId;
use crate::domain::values::trust::TrustWeights;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Fixed request budget for one provider within a rolling window.
#[derive(Debug, Clone)]
pub struct RateBudget {
    pub max_calls: u32,
    pub window_secs: u64,
    /// Longest a caller waits for the window to roll before the tier is
    /// abandoned for this resolution.
    pub max_wait_ms: u64,
}

/// All engine tuning in one injected object. No module-level mutable
/// state: construct once, pass by value to the facade.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Holdings at or below this portfolio weight skip the external
    /// cascade entirely.
    pub tier_threshold: f64,
    /// Negative-cache TTL for a genuine miss.
    pub unresolved_ttl_hours: i64,
    /// Negative-cache TTL when any tier signalled rate-limiting.
    pub rate_limited_ttl_hours: i64,
    /// Mirror age beyond which a full registry sync is due.
    pub registry_stale_after_hours: i64,
    /// Name variants offered to the batched free tier.
    pub name_variant_limit: usize,
    /// Ticker variants offered to the unreliable fallback tier.
    pub fallback_variant_limit: usize,
    /// Concurrent resolutions in a batch run.
    pub batch_parallelism: usize,
    /// Per-provider budgets, keyed by provider name. Providers without a
    /// budget are unmetered.
    pub budgets: HashMap<String, RateBudget>,
    /// Curated ticker → id overrides, checked before any store lookup.
    pub manual_overrides: HashMap<String, CanonicalId>,
    pub trust: TrustWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut budgets = HashMap::new();
        budgets.insert(
            "wikidata".to_string(),
            RateBudget {
                max_calls: 30,
                window_secs: 60,
                max_wait_ms: 2_000,
            },
        );
        budgets.insert(
            "finnhub".to_string(),
            RateBudget {
                max_calls: 60,
                window_secs: 60,
                max_wait_ms: 2_000,
            },
        );
        budgets.insert(
            "suggest".to_string(),
            RateBudget {
                max_calls: 30,
                window_secs: 60,
                max_wait_ms: 2_000,
            },
        );

        Self {
            tier_threshold: 1.0,
            unresolved_ttl_hours: 24,
            rate_limited_ttl_hours: 1,
            registry_stale_after_hours: 24,
            name_variant_limit: 5,
            fallback_variant_limit: 2,
            batch_parallelism: 8,
            budgets,
            manual_overrides: HashMap::new(),
            trust: TrustWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Load a curated ticker → id map from a JSON file. Entries whose id
    /// fails checksum validation are skipped with a warning; a curator
    /// typo must not poison resolution.
    pub fn load_manual_overrides(path: &Path) -> Result<HashMap<String, CanonicalId>, EngineError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Parse(format!("cannot read overrides {path:?}: {e}")))?;
        let raw: HashMap<String, String> = serde_json::from_str(&text)
            .map_err(|e| EngineError::Parse(format!("invalid overrides {path:?}: {e}")))?;

        let mut overrides = HashMap::new();
        for (ticker, id) in raw {
            match CanonicalId::parse(&id) {
                Ok(id) => {
                    overrides.insert(ticker.trim().to_uppercase(), id);
                }
                Err(e) => warn!("Skipping manual override for {ticker}: {e}"),
            }
        }
        Ok(overrides)
    }
}
