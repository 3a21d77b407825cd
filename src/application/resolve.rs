//! The resolution cascade.
//!
//! Tiers run in a fixed order and the first hit wins: `source` and
//! `confidence` always reflect the earliest tier that answered, never a
//! recomputation from a later one.
//!
//! 1. provider-supplied id (checksum-validated)     → 1.00
//! 2. manual override map                           → 0.85
//! 3. canonical store (cache, listings, aliases)    → stored / 0.95
//! 4. negative-cache short-circuit (no network past this point for a
//!    recently failed identifier)
//! 5. registry live query                           → 0.90
//! 6. tiering gate (small holdings stop here)
//! 7. external providers, cheapest first            → 0.80 / 0.75 / 0.70
//!
//! Successes are written back to the store; externally-sourced successes
//! are also contributed to the registry, best-effort. Total failure
//! writes a negative entry whose TTL depends on whether any tier
//! signalled rate-limiting.

use crate::config::EngineConfig;
use crate::domain::entities::cache_entry::{CacheStatus, ResolutionCacheEntry};
use crate::domain::entities::resolution::{ResolutionRequest, ResolutionResult};
use crate::domain::error::EngineError;
use crate::domain::normalize::{name_variants, normalize_name, ticker_variants};
use crate::domain::ports::canonical_store::CanonicalStore;
use crate::domain::ports::format_observer::FormatObserver;
use crate::domain::ports::lookup_provider::{LookupOutcome, LookupProvider, ProbeAttempt};
use crate::domain::ports::registry_client::{RegistryClient, RegistryFact};
use crate::domain::values::alias_type::AliasType;
use crate::domain::values::canonical_id::CanonicalId;
use crate::domain::values::confidence::Confidence;
use crate::domain::values::source::Source;
use crate::infrastructure::providers::governor::RateGovernor;
use crate::infrastructure::sqlite::store::record_identity;
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, warn};

const CONFIDENCE_PROVIDER: f64 = 1.0;
const CONFIDENCE_STORE: f64 = 0.95;
const CONFIDENCE_REGISTRY: f64 = 0.90;
const CONFIDENCE_MANUAL: f64 = 0.85;

pub struct ResolveUseCase {
    store: Arc<dyn CanonicalStore>,
    registry: Arc<dyn RegistryClient>,
    providers: Vec<Arc<dyn LookupProvider>>,
    governor: Arc<RateGovernor>,
    observer: Arc<dyn FormatObserver>,
    config: EngineConfig,
}

impl ResolveUseCase {
    pub fn new(
        store: Arc<dyn CanonicalStore>,
        registry: Arc<dyn RegistryClient>,
        providers: Vec<Arc<dyn LookupProvider>>,
        governor: Arc<RateGovernor>,
        observer: Arc<dyn FormatObserver>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            registry,
            providers,
            governor,
            observer,
            config,
        }
    }

    pub async fn execute(&self, req: &ResolutionRequest) -> Result<ResolutionResult, EngineError> {
        let ticker_raw = req.raw_ticker.trim();
        let name_raw = req.raw_name.trim();
        if ticker_raw.is_empty() && name_raw.is_empty() && req.provider_id.is_none() {
            return Err(EngineError::InvalidInput(
                "resolution request carries no ticker, name, or provider id".into(),
            ));
        }

        let tickers = ticker_variants(ticker_raw);
        let names = name_variants(name_raw);
        let name_clean = normalize_name(name_raw);
        let primary_ticker = tickers.first().cloned().unwrap_or_default();

        // 1. Provider-supplied id. A checksum failure means the id is
        // treated as absent, not as an error.
        if let Some(raw) = req.provider_id.as_deref() {
            match CanonicalId::parse(raw) {
                Ok(id) => {
                    return Ok(ResolutionResult::resolved(
                        id,
                        "provider",
                        Source::Provider,
                        Confidence::clamped(CONFIDENCE_PROVIDER),
                    ));
                }
                Err(e) => debug!("Ignoring provider id that fails validation: {e}"),
            }
        }

        // 2. Manual overrides, across all ticker variants.
        for ticker in &tickers {
            if let Some(id) = self.config.manual_overrides.get(ticker) {
                return Ok(ResolutionResult::resolved(
                    id.clone(),
                    "manual",
                    Source::Manual,
                    Confidence::clamped(CONFIDENCE_MANUAL),
                ));
            }
        }

        // 3. Canonical store.
        if let Some(result) = self.store_lookup(&tickers, &names) {
            return Ok(result);
        }

        // 4. Negative-cache short-circuit, after the store so a later
        // positive fact stays visible, before any network call.
        let (negative_key, negative_kind) = if !primary_ticker.is_empty() {
            (primary_ticker.clone(), AliasType::Ticker)
        } else {
            (name_clean.clone(), AliasType::Name)
        };
        if let Some(entry) = self.cached_entry(&negative_key, negative_kind) {
            if !entry.is_resolved() {
                return Ok(ResolutionResult::unresolved("negative_cached"));
            }
        }

        // 5. Registry live query.
        if let Some(result) = self.registry_lookup(&tickers, &names, &name_clean).await {
            return Ok(result);
        }

        // 6. Tiering gate: a deliberate omission, never cached.
        if req.weight <= self.config.tier_threshold {
            return Ok(ResolutionResult::skipped("tier2_skipped"));
        }

        // 7. External provider cascade, fixed order.
        let mut rate_limited = false;
        for provider in &self.providers {
            if !self.governor.acquire(provider.name()).await {
                warn!(
                    "No call budget for {} within wait bound, skipping tier",
                    provider.name()
                );
                rate_limited = true;
                continue;
            }

            let report = match provider.lookup(&tickers, &names).await {
                Ok(report) => report,
                Err(e) => {
                    warn!("{} lookup failed: {e}", provider.name());
                    continue;
                }
            };
            self.record_attempts(
                &req.raw_ticker,
                provider.name(),
                &report.attempts,
                req.context_id.as_deref(),
            );

            match report.outcome {
                LookupOutcome::Found(id) => {
                    let result = ResolutionResult::resolved(
                        id.clone(),
                        provider.name(),
                        provider.source(),
                        provider.confidence(),
                    );
                    self.write_through(
                        &primary_ticker,
                        &name_clean,
                        &id,
                        provider.source(),
                        provider.confidence(),
                    );
                    self.contribute(&primary_ticker, &name_clean, &id).await;
                    return Ok(result);
                }
                LookupOutcome::RateLimited => rate_limited = true,
                LookupOutcome::Miss => {}
            }
        }

        // 9. Total failure: negative entry. Rate-limit signals shorten the
        // TTL so the identifier is retried once the window clears.
        let (status, ttl_hours) = if rate_limited {
            (CacheStatus::RateLimited, self.config.rate_limited_ttl_hours)
        } else {
            (CacheStatus::Unresolved, self.config.unresolved_ttl_hours)
        };
        if !negative_key.is_empty() {
            let entry = ResolutionCacheEntry::negative(
                &negative_key,
                negative_kind,
                status,
                Duration::hours(ttl_hours),
            );
            if let Err(e) = self.store.put_cache_entry(&entry) {
                warn!("Failed to write negative cache entry: {e}");
            }
        }
        Ok(ResolutionResult::unresolved("cascade_exhausted"))
    }

    /// Step 3: positive cache then mirror tables, tickers before names.
    /// Cache hits keep the confidence and source they were stored with.
    fn store_lookup(&self, tickers: &[String], names: &[String]) -> Option<ResolutionResult> {
        for ticker in tickers {
            if let Some(result) = self.positive_cache_hit(ticker, AliasType::Ticker, "cache_ticker")
            {
                return Some(result);
            }
            match self.store.lookup_by_ticker(ticker) {
                Ok(Some(id)) => {
                    return Some(ResolutionResult::resolved(
                        id,
                        "store_ticker",
                        Source::Store,
                        Confidence::clamped(CONFIDENCE_STORE),
                    ));
                }
                Ok(None) => {}
                Err(e) => warn!("Ticker lookup degraded for {ticker}: {e}"),
            }
        }
        for name in names {
            if let Some(result) = self.positive_cache_hit(name, AliasType::Name, "cache_name") {
                return Some(result);
            }
            match self.store.lookup_by_alias(name) {
                Ok(Some(id)) => {
                    return Some(ResolutionResult::resolved(
                        id,
                        "store_alias",
                        Source::Store,
                        Confidence::clamped(CONFIDENCE_STORE),
                    ));
                }
                Ok(None) => {}
                Err(e) => warn!("Alias lookup degraded for {name}: {e}"),
            }
        }
        None
    }

    fn positive_cache_hit(
        &self,
        key: &str,
        kind: AliasType,
        detail: &str,
    ) -> Option<ResolutionResult> {
        let entry = self.cached_entry(key, kind)?;
        let id = entry.resolved_id.clone()?;
        if !entry.is_resolved() {
            return None;
        }
        Some(ResolutionResult::resolved(
            id,
            detail,
            entry.source.unwrap_or(Source::Store),
            entry.confidence,
        ))
    }

    /// Cache read that degrades to a miss on storage failure: a broken
    /// cache forfeits the optimization, never the resolution.
    fn cached_entry(&self, key: &str, kind: AliasType) -> Option<ResolutionCacheEntry> {
        match self.store.get_cache_entry(key, kind) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Cache read degraded for {key}: {e}");
                None
            }
        }
    }

    /// Step 5. Any registry failure degrades to a miss; the engine keeps
    /// functioning on the store and providers alone.
    async fn registry_lookup(
        &self,
        tickers: &[String],
        names: &[String],
        name_clean: &str,
    ) -> Option<ResolutionResult> {
        for ticker in tickers {
            match self.registry.resolve_ticker(ticker, None).await {
                Ok(Some(fact)) => {
                    self.mirror_registry_fact(&fact, ticker, AliasType::Ticker, name_clean);
                    return Some(ResolutionResult::resolved(
                        fact.id,
                        "registry_ticker",
                        Source::Registry,
                        Confidence::clamped(CONFIDENCE_REGISTRY),
                    ));
                }
                Ok(None) => {}
                Err(e) => {
                    debug!("Registry unavailable, continuing offline: {e}");
                    return None;
                }
            }
        }
        for name in names {
            match self.registry.resolve_alias(name).await {
                Ok(Some(fact)) => {
                    self.mirror_registry_fact(&fact, name, AliasType::Name, name_clean);
                    return Some(ResolutionResult::resolved(
                        fact.id,
                        "registry_alias",
                        Source::Registry,
                        Confidence::clamped(CONFIDENCE_REGISTRY),
                    ));
                }
                Ok(None) => {}
                Err(e) => {
                    debug!("Registry unavailable, continuing offline: {e}");
                    return None;
                }
            }
        }
        None
    }

    /// Write-through after a registry hit: mirror the fact and store a
    /// never-expiring positive entry under the key that matched.
    fn mirror_registry_fact(
        &self,
        fact: &RegistryFact,
        matched_key: &str,
        kind: AliasType,
        name_clean: &str,
    ) {
        let display_name = if fact.display_name.is_empty() {
            name_clean
        } else {
            &fact.display_name
        };
        let ticker = if kind == AliasType::Ticker {
            matched_key
        } else {
            ""
        };
        let alias = if kind == AliasType::Name {
            let mut alias =
                crate::domain::entities::asset::Alias::new(matched_key, AliasType::Name, fact.id.clone());
            alias.contributor_count = fact.contributor_count;
            Some(alias)
        } else {
            None
        };
        if let Err(e) = record_identity(
            self.store.as_ref(),
            &fact.id,
            display_name,
            fact.asset_class,
            ticker,
            alias.as_ref(),
        ) {
            warn!("Mirror write failed after registry hit: {e}");
        }

        let entry = ResolutionCacheEntry::positive(
            matched_key,
            kind,
            fact.id.clone(),
            Confidence::clamped(CONFIDENCE_REGISTRY),
            Source::Registry,
        );
        if let Err(e) = self.store.put_cache_entry(&entry) {
            warn!("Cache write failed after registry hit: {e}");
        }
    }

    /// Write-through after an external provider hit. Failures are logged
    /// and never change the already-computed result.
    fn write_through(
        &self,
        ticker: &str,
        name_clean: &str,
        id: &CanonicalId,
        source: Source,
        confidence: Confidence,
    ) {
        let (key, kind) = if !ticker.is_empty() {
            (ticker, AliasType::Ticker)
        } else {
            (name_clean, AliasType::Name)
        };
        if key.is_empty() {
            return;
        }

        let entry = ResolutionCacheEntry::positive(key, kind, id.clone(), confidence, source);
        if let Err(e) = self.store.put_cache_entry(&entry) {
            warn!("Cache write failed after provider hit: {e}");
        }

        let display_name = if name_clean.is_empty() { ticker } else { name_clean };
        let alias = if name_clean.len() > 2 {
            Some(crate::domain::entities::asset::Alias::new(
                name_clean,
                AliasType::Name,
                id.clone(),
            ))
        } else {
            None
        };
        if let Err(e) = record_identity(
            self.store.as_ref(),
            id,
            display_name,
            crate::domain::values::asset_class::AssetClass::Other,
            ticker,
            alias.as_ref(),
        ) {
            warn!("Mirror write failed after provider hit: {e}");
        }
    }

    /// Best-effort contribution of an externally-learned fact back to the
    /// registry. Never fatal.
    async fn contribute(&self, ticker: &str, name_clean: &str, id: &CanonicalId) {
        if !ticker.is_empty() {
            if let Err(e) = self
                .registry
                .contribute_listing(id, ticker, "UNKNOWN", "USD")
                .await
            {
                debug!("Listing contribution skipped: {e}");
            }
        }
        if name_clean.len() > 2 {
            if let Err(e) = self
                .registry
                .contribute_alias(name_clean, id, AliasType::Name)
                .await
            {
                debug!("Alias contribution skipped: {e}");
            }
        }
    }

    fn record_attempts(
        &self,
        raw_ticker: &str,
        provider: &str,
        attempts: &[ProbeAttempt],
        context_id: Option<&str>,
    ) {
        for attempt in attempts {
            if let Err(e) = self.observer.record(
                raw_ticker,
                &attempt.variant,
                provider,
                attempt.succeeded,
                context_id,
            ) {
                warn!("Format log write failed: {e}");
            }
        }
    }
}
