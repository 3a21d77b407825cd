use crate::domain::error::EngineError;
use crate::domain::ports::canonical_store::CanonicalStore;
use crate::domain::ports::registry_client::RegistryClient;
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub assets: usize,
    pub listings: usize,
    pub aliases: usize,
}

/// Full mirror sync of the identity domain from the registry into the
/// local store.
pub struct SyncUseCase {
    store: Arc<dyn CanonicalStore>,
    registry: Arc<dyn RegistryClient>,
}

impl SyncUseCase {
    pub fn new(store: Arc<dyn CanonicalStore>, registry: Arc<dyn RegistryClient>) -> Self {
        Self { store, registry }
    }

    pub async fn execute(&self) -> Result<SyncReport, EngineError> {
        let snapshot = self.registry.sync_identity_domain().await?;
        let now = Utc::now();

        for asset in &snapshot.assets {
            self.store.upsert_asset(asset)?;
        }
        self.store.mark_synced("assets", now)?;

        for listing in &snapshot.listings {
            self.store.upsert_listing(listing)?;
        }
        self.store.mark_synced("listings", now)?;

        for alias in &snapshot.aliases {
            self.store.upsert_alias(alias)?;
        }
        self.store.mark_synced("aliases", now)?;

        let report = SyncReport {
            assets: snapshot.assets.len(),
            listings: snapshot.listings.len(),
            aliases: snapshot.aliases.len(),
        };
        info!(
            "Identity mirror synced: {} assets, {} listings, {} aliases",
            report.assets, report.listings, report.aliases
        );
        Ok(report)
    }

    pub fn is_stale(&self, max_age: Duration) -> Result<bool, EngineError> {
        self.store.is_stale(max_age)
    }
}
