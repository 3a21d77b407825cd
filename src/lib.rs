pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::batch::{BatchReport, BatchResolveUseCase};
use crate::application::resolve::ResolveUseCase;
use crate::application::sync::{SyncReport, SyncUseCase};
use crate::config::EngineConfig;
use crate::domain::entities::resolution::{ResolutionRequest, ResolutionResult};
use crate::domain::error::EngineError;
use crate::domain::ports::canonical_store::CanonicalStore;
use crate::domain::ports::format_observer::{FormatObserver, FormatStat};
use crate::domain::ports::lookup_provider::LookupProvider;
use crate::domain::ports::registry_client::RegistryClient;
use crate::infrastructure::providers::finnhub::FinnhubProvider;
use crate::infrastructure::providers::governor::RateGovernor;
use crate::infrastructure::providers::suggest::SuggestProvider;
use crate::infrastructure::providers::wikidata::WikidataProvider;
use crate::infrastructure::registry::http_client::HttpRegistryClient;
use crate::infrastructure::registry::offline::OfflineRegistry;
use crate::infrastructure::sqlite::format_log::SqliteFormatObserver;
use crate::infrastructure::sqlite::store::SqliteCanonicalStore;
use chrono::Duration;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// The identity resolution engine: one embedded store, one registry
/// client, the external provider cascade, and the orchestrating use cases
/// behind a single facade.
pub struct Canonid {
    resolve_uc: Arc<ResolveUseCase>,
    batch_uc: BatchResolveUseCase,
    store: Arc<dyn CanonicalStore>,
    registry: Arc<dyn RegistryClient>,
    observer: Arc<dyn FormatObserver>,
    config: EngineConfig,
}

impl Canonid {
    /// Production wiring from environment variables:
    /// `CANONID_REGISTRY_URL` / `CANONID_REGISTRY_KEY` select the registry
    /// (offline without them), `FINNHUB_API_KEY` enables the rate-limited
    /// tier, `CANONID_OVERRIDES` points at a curated ticker → id JSON map.
    ///
    /// When the local mirror is stale a best-effort background sync is
    /// spawned; tests use `with_deps` and stay deterministic.
    pub fn new(db_path: &str) -> Result<Self, EngineError> {
        let mut config = EngineConfig::default();
        if let Ok(path) = std::env::var("CANONID_OVERRIDES") {
            match EngineConfig::load_manual_overrides(Path::new(&path)) {
                Ok(overrides) => config.manual_overrides = overrides,
                Err(e) => warn!("Manual overrides not loaded: {e}"),
            }
        }

        let registry: Arc<dyn RegistryClient> = match std::env::var("CANONID_REGISTRY_URL") {
            Ok(url) if !url.is_empty() => {
                let key = std::env::var("CANONID_REGISTRY_KEY").unwrap_or_default();
                Arc::new(HttpRegistryClient::new(&url, &key, config.trust.clone()))
            }
            _ => Arc::new(OfflineRegistry),
        };

        let mut providers: Vec<Arc<dyn LookupProvider>> =
            vec![Arc::new(WikidataProvider::new(config.name_variant_limit))];
        if let Ok(key) = std::env::var("FINNHUB_API_KEY") {
            if !key.is_empty() {
                providers.push(Arc::new(FinnhubProvider::new(&key)));
            }
        }
        providers.push(Arc::new(SuggestProvider::new(config.fallback_variant_limit)));

        let store: Arc<dyn CanonicalStore> = Arc::new(SqliteCanonicalStore::open(db_path)?);
        let observer: Arc<dyn FormatObserver> = Arc::new(SqliteFormatObserver::open(db_path)?);
        let governor = Arc::new(RateGovernor::new(config.budgets.clone()));

        let engine = Self::with_deps(store, registry, providers, governor, observer, config);
        engine.maybe_spawn_background_sync();
        Ok(engine)
    }

    pub fn with_deps(
        store: Arc<dyn CanonicalStore>,
        registry: Arc<dyn RegistryClient>,
        providers: Vec<Arc<dyn LookupProvider>>,
        governor: Arc<RateGovernor>,
        observer: Arc<dyn FormatObserver>,
        config: EngineConfig,
    ) -> Self {
        let resolve_uc = Arc::new(ResolveUseCase::new(
            store.clone(),
            registry.clone(),
            providers,
            governor,
            observer.clone(),
            config.clone(),
        ));
        let batch_uc = BatchResolveUseCase::new(resolve_uc.clone(), config.batch_parallelism);

        Self {
            resolve_uc,
            batch_uc,
            store,
            registry,
            observer,
            config,
        }
    }

    fn maybe_spawn_background_sync(&self) {
        let max_age = Duration::hours(self.config.registry_stale_after_hours);
        if !matches!(self.store.is_stale(max_age), Ok(true)) {
            return;
        }
        if tokio::runtime::Handle::try_current().is_err() {
            return;
        }
        let store = self.store.clone();
        let registry = self.registry.clone();
        tokio::spawn(async move {
            let sync = SyncUseCase::new(store, registry);
            if let Err(e) = sync.execute().await {
                warn!("Background registry sync failed: {e}");
            }
        });
    }

    pub async fn resolve(&self, request: ResolutionRequest) -> Result<ResolutionResult, EngineError> {
        self.resolve_uc.execute(&request).await
    }

    pub async fn batch_resolve(&self, requests: Vec<ResolutionRequest>) -> BatchReport {
        self.batch_uc.execute(requests).await
    }

    pub async fn sync(&self) -> Result<SyncReport, EngineError> {
        SyncUseCase::new(self.store.clone(), self.registry.clone())
            .execute()
            .await
    }

    pub fn is_stale(&self) -> Result<bool, EngineError> {
        self.store
            .is_stale(Duration::hours(self.config.registry_stale_after_hours))
    }

    pub fn purge_expired(&self) -> Result<usize, EngineError> {
        self.store.purge_expired()
    }

    pub fn format_stats(&self) -> Result<Vec<FormatStat>, EngineError> {
        self.observer.aggregate_stats()
    }

    pub fn prune_format_log(&self, days: i64) -> Result<usize, EngineError> {
        self.observer.prune_older_than(days)
    }
}
