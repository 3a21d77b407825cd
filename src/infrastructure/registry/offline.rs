use crate::domain::error::EngineError;
use crate::domain::ports::registry_client::{IdentitySnapshot, RegistryClient, RegistryFact};
use crate::domain::values::alias_type::AliasType;
use crate::domain::values::canonical_id::CanonicalId;
use async_trait::async_trait;

/// Stand-in when no registry is configured. Every operation reports
/// "unavailable", which the cascade treats as a miss; the engine runs on
/// the local store and external providers alone.
pub struct OfflineRegistry;

impl OfflineRegistry {
    fn unavailable<T>() -> Result<T, EngineError> {
        Err(EngineError::Registry("registry not configured".into()))
    }
}

#[async_trait]
impl RegistryClient for OfflineRegistry {
    async fn resolve_ticker(
        &self,
        _ticker: &str,
        _exchange: Option<&str>,
    ) -> Result<Option<RegistryFact>, EngineError> {
        Self::unavailable()
    }

    async fn batch_resolve_tickers(
        &self,
        _tickers: &[String],
    ) -> Result<Vec<(String, RegistryFact)>, EngineError> {
        Self::unavailable()
    }

    async fn resolve_alias(&self, _text: &str) -> Result<Option<RegistryFact>, EngineError> {
        Self::unavailable()
    }

    async fn contribute_listing(
        &self,
        _id: &CanonicalId,
        _ticker: &str,
        _exchange: &str,
        _currency: &str,
    ) -> Result<(), EngineError> {
        Self::unavailable()
    }

    async fn contribute_alias(
        &self,
        _text: &str,
        _id: &CanonicalId,
        _alias_type: AliasType,
    ) -> Result<(), EngineError> {
        Self::unavailable()
    }

    async fn sync_identity_domain(&self) -> Result<IdentitySnapshot, EngineError> {
        Self::unavailable()
    }
}
