use crate::domain::entities::asset::{Alias, CanonicalAsset, Listing};
use crate::domain::error::EngineError;
use crate::domain::values::alias_type::AliasType;
use crate::domain::values::asset_class::AssetClass;
use crate::domain::values::canonical_id::CanonicalId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One identity fact returned by the registry, with the consensus fields
/// the trust score is computed from.
#[derive(Debug, Clone)]
pub struct RegistryFact {
    pub id: CanonicalId,
    pub display_name: String,
    pub asset_class: AssetClass,
    pub contributor_count: u32,
    pub last_confirmed_at: Option<DateTime<Utc>>,
    pub agreement_rate: f64,
}

/// Full mirror payload of the identity domain.
#[derive(Debug, Clone, Default)]
pub struct IdentitySnapshot {
    pub assets: Vec<CanonicalAsset>,
    pub listings: Vec<Listing>,
    pub aliases: Vec<Alias>,
}

/// Client to the shared community registry, reached only through
/// whitelisted, server-validated entry points.
///
/// Every operation returns `EngineError::Registry` when the registry is
/// unreachable or unconfigured; callers treat that as a miss and keep the
/// engine functioning offline. Contributions are idempotent under retry:
/// the server increments contributor counts instead of duplicating facts.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    async fn resolve_ticker(
        &self,
        ticker: &str,
        exchange: Option<&str>,
    ) -> Result<Option<RegistryFact>, EngineError>;

    async fn batch_resolve_tickers(
        &self,
        tickers: &[String],
    ) -> Result<Vec<(String, RegistryFact)>, EngineError>;

    async fn resolve_alias(&self, text: &str) -> Result<Option<RegistryFact>, EngineError>;

    async fn contribute_listing(
        &self,
        id: &CanonicalId,
        ticker: &str,
        exchange: &str,
        currency: &str,
    ) -> Result<(), EngineError>;

    async fn contribute_alias(
        &self,
        text: &str,
        id: &CanonicalId,
        alias_type: AliasType,
    ) -> Result<(), EngineError>;

    async fn sync_identity_domain(&self) -> Result<IdentitySnapshot, EngineError>;
}
