//! Shared test helpers: in-memory engine wiring plus counting stubs for
//! the registry and the provider tiers.

#![allow(dead_code)]

use async_trait::async_trait;
use canonid::config::EngineConfig;
use canonid::domain::entities::resolution::ResolutionRequest;
use canonid::domain::error::EngineError;
use canonid::domain::ports::canonical_store::CanonicalStore;
use canonid::domain::ports::lookup_provider::{
    LookupOutcome, LookupProvider, LookupReport, ProbeAttempt,
};
use canonid::domain::ports::registry_client::{IdentitySnapshot, RegistryClient, RegistryFact};
use canonid::domain::values::alias_type::AliasType;
use canonid::domain::values::asset_class::AssetClass;
use canonid::domain::values::canonical_id::CanonicalId;
use canonid::domain::values::confidence::Confidence;
use canonid::domain::values::source::Source;
use canonid::infrastructure::providers::governor::RateGovernor;
use canonid::infrastructure::registry::offline::OfflineRegistry;
use canonid::infrastructure::sqlite::format_log::SqliteFormatObserver;
use canonid::infrastructure::sqlite::store::SqliteCanonicalStore;
use canonid::Canonid;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn isin(raw: &str) -> CanonicalId {
    CanonicalId::parse(raw).unwrap()
}

pub fn request(ticker: &str, name: &str, weight: f64) -> ResolutionRequest {
    ResolutionRequest::new(ticker, name, weight)
}

pub fn memory_store() -> Arc<SqliteCanonicalStore> {
    Arc::new(SqliteCanonicalStore::open(":memory:").unwrap())
}

pub fn engine(
    registry: Arc<dyn RegistryClient>,
    providers: Vec<Arc<dyn LookupProvider>>,
) -> Canonid {
    engine_full(memory_store(), registry, providers, EngineConfig::default())
}

pub fn offline_engine(providers: Vec<Arc<dyn LookupProvider>>) -> Canonid {
    engine(Arc::new(OfflineRegistry), providers)
}

pub fn engine_full(
    store: Arc<SqliteCanonicalStore>,
    registry: Arc<dyn RegistryClient>,
    providers: Vec<Arc<dyn LookupProvider>>,
    config: EngineConfig,
) -> Canonid {
    let store: Arc<dyn CanonicalStore> = store;
    let observer = Arc::new(SqliteFormatObserver::open(":memory:").unwrap());
    let governor = Arc::new(RateGovernor::new(config.budgets.clone()));
    Canonid::with_deps(store, registry, providers, governor, observer, config)
}

/// Counting provider stub with fixed answers per ticker or name variant.
pub struct StubProvider {
    name: &'static str,
    source: Source,
    confidence: f64,
    by_ticker: HashMap<String, CanonicalId>,
    by_name: HashMap<String, CanonicalId>,
    rate_limited: bool,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(name: &'static str, source: Source, confidence: f64) -> Self {
        Self {
            name,
            source,
            confidence,
            by_ticker: HashMap::new(),
            by_name: HashMap::new(),
            rate_limited: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn answer_ticker(mut self, ticker: &str, id: CanonicalId) -> Self {
        self.by_ticker.insert(ticker.to_uppercase(), id);
        self
    }

    pub fn answer_name(mut self, name: &str, id: CanonicalId) -> Self {
        self.by_name.insert(name.to_uppercase(), id);
        self
    }

    pub fn rate_limited(mut self) -> Self {
        self.rate_limited = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LookupProvider for StubProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn source(&self) -> Source {
        self.source
    }

    fn confidence(&self) -> Confidence {
        Confidence::clamped(self.confidence)
    }

    async fn lookup(
        &self,
        ticker_variants: &[String],
        name_variants: &[String],
    ) -> Result<LookupReport, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let primary = ticker_variants.first().cloned().unwrap_or_default();

        if self.rate_limited {
            return Ok(LookupReport {
                outcome: LookupOutcome::RateLimited,
                attempts: vec![ProbeAttempt {
                    variant: primary,
                    succeeded: false,
                }],
            });
        }

        for ticker in ticker_variants {
            if let Some(id) = self.by_ticker.get(ticker) {
                return Ok(LookupReport {
                    outcome: LookupOutcome::Found(id.clone()),
                    attempts: vec![ProbeAttempt {
                        variant: ticker.clone(),
                        succeeded: true,
                    }],
                });
            }
        }
        for name in name_variants {
            if let Some(id) = self.by_name.get(name) {
                return Ok(LookupReport {
                    outcome: LookupOutcome::Found(id.clone()),
                    attempts: vec![ProbeAttempt {
                        variant: name.clone(),
                        succeeded: true,
                    }],
                });
            }
        }

        Ok(LookupReport::miss(vec![ProbeAttempt {
            variant: primary,
            succeeded: false,
        }]))
    }
}

pub fn fact(id: CanonicalId, display_name: &str) -> RegistryFact {
    RegistryFact {
        id,
        display_name: display_name.to_string(),
        asset_class: AssetClass::Equity,
        contributor_count: 3,
        last_confirmed_at: Some(Utc::now()),
        agreement_rate: 1.0,
    }
}

/// In-memory registry stub. Contributions land in the same maps the
/// snapshot is built from, so contribute-then-sync round trips work.
pub struct StubRegistry {
    available: bool,
    tickers: Mutex<HashMap<String, RegistryFact>>,
    aliases: Mutex<HashMap<String, RegistryFact>>,
    pub contributed_listings: Mutex<Vec<(String, String)>>,
    pub contributed_aliases: Mutex<Vec<(String, String)>>,
    lookup_calls: AtomicUsize,
}

impl StubRegistry {
    pub fn new() -> Self {
        Self {
            available: true,
            tickers: Mutex::new(HashMap::new()),
            aliases: Mutex::new(HashMap::new()),
            contributed_listings: Mutex::new(Vec::new()),
            contributed_aliases: Mutex::new(Vec::new()),
            lookup_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_ticker(self, ticker: &str, fact: RegistryFact) -> Self {
        self.tickers
            .lock()
            .unwrap()
            .insert(ticker.to_uppercase(), fact);
        self
    }

    pub fn with_alias(self, text: &str, fact: RegistryFact) -> Self {
        self.aliases
            .lock()
            .unwrap()
            .insert(text.to_uppercase(), fact);
        self
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryClient for StubRegistry {
    async fn resolve_ticker(
        &self,
        ticker: &str,
        _exchange: Option<&str>,
    ) -> Result<Option<RegistryFact>, EngineError> {
        if !self.available {
            return Err(EngineError::Registry("stub offline".into()));
        }
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tickers.lock().unwrap().get(&ticker.to_uppercase()).cloned())
    }

    async fn batch_resolve_tickers(
        &self,
        tickers: &[String],
    ) -> Result<Vec<(String, RegistryFact)>, EngineError> {
        let map = self.tickers.lock().unwrap();
        Ok(tickers
            .iter()
            .filter_map(|t| map.get(&t.to_uppercase()).map(|f| (t.clone(), f.clone())))
            .collect())
    }

    async fn resolve_alias(&self, text: &str) -> Result<Option<RegistryFact>, EngineError> {
        if !self.available {
            return Err(EngineError::Registry("stub offline".into()));
        }
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.aliases.lock().unwrap().get(&text.to_uppercase()).cloned())
    }

    async fn contribute_listing(
        &self,
        id: &CanonicalId,
        ticker: &str,
        _exchange: &str,
        _currency: &str,
    ) -> Result<(), EngineError> {
        self.contributed_listings
            .lock()
            .unwrap()
            .push((ticker.to_string(), id.as_str().to_string()));
        self.tickers
            .lock()
            .unwrap()
            .insert(ticker.to_uppercase(), fact(id.clone(), ""));
        Ok(())
    }

    async fn contribute_alias(
        &self,
        text: &str,
        id: &CanonicalId,
        _alias_type: AliasType,
    ) -> Result<(), EngineError> {
        self.contributed_aliases
            .lock()
            .unwrap()
            .push((text.to_string(), id.as_str().to_string()));
        self.aliases
            .lock()
            .unwrap()
            .insert(text.to_uppercase(), fact(id.clone(), text));
        Ok(())
    }

    async fn sync_identity_domain(&self) -> Result<IdentitySnapshot, EngineError> {
        if !self.available {
            return Err(EngineError::Registry("stub offline".into()));
        }
        let mut snapshot = IdentitySnapshot::default();
        for (ticker, fact) in self.tickers.lock().unwrap().iter() {
            snapshot.assets.push(
                canonid::domain::entities::asset::CanonicalAsset::new(
                    fact.id.clone(),
                    fact.display_name.clone(),
                    fact.asset_class,
                    "USD".to_string(),
                ),
            );
            snapshot
                .listings
                .push(canonid::domain::entities::asset::Listing::new(
                    ticker,
                    "UNKNOWN",
                    fact.id.clone(),
                    "USD",
                ));
        }
        for (text, fact) in self.aliases.lock().unwrap().iter() {
            snapshot
                .aliases
                .push(canonid::domain::entities::asset::Alias::new(
                    text,
                    AliasType::Name,
                    fact.id.clone(),
                ));
        }
        Ok(snapshot)
    }
}
