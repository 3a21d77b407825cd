use crate::domain::values::alias_type::AliasType;
use crate::domain::values::asset_class::AssetClass;
use crate::domain::values::canonical_id::CanonicalId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One security, keyed by its canonical identifier. Created on first
/// resolution or registry sync; the engine never deletes assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalAsset {
    pub id: CanonicalId,
    pub display_name: String,
    pub asset_class: AssetClass,
    pub base_currency: String,
    pub created_at: DateTime<Utc>,
}

impl CanonicalAsset {
    pub fn new(
        id: CanonicalId,
        display_name: String,
        asset_class: AssetClass,
        base_currency: String,
    ) -> Self {
        Self {
            id,
            display_name,
            asset_class,
            base_currency,
            created_at: Utc::now(),
        }
    }
}

/// A venue listing of an asset. Unique on `(ticker, exchange)`; one asset
/// may be listed on many venues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub ticker: String,
    pub exchange: String,
    pub asset_id: CanonicalId,
    pub trading_currency: String,
}

impl Listing {
    pub fn new(ticker: &str, exchange: &str, asset_id: CanonicalId, trading_currency: &str) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            exchange: exchange.trim().to_uppercase(),
            asset_id,
            trading_currency: trading_currency.trim().to_uppercase(),
        }
    }
}

/// A free-text name known to refer to an asset. Matching is
/// case-insensitive; `contributor_count` feeds confidence scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alias {
    pub text: String,
    pub alias_type: AliasType,
    pub asset_id: CanonicalId,
    pub contributor_count: u32,
}

impl Alias {
    pub fn new(text: &str, alias_type: AliasType, asset_id: CanonicalId) -> Self {
        Self {
            text: text.trim().to_string(),
            alias_type,
            asset_id,
            contributor_count: 1,
        }
    }
}
