use crate::domain::entities::asset::{Alias, CanonicalAsset, Listing};
use crate::domain::entities::cache_entry::ResolutionCacheEntry;
use crate::domain::error::EngineError;
use crate::domain::values::alias_type::AliasType;
use crate::domain::values::canonical_id::CanonicalId;
use chrono::{DateTime, Duration, Utc};

/// Embedded, process-local mirror of the identity domain plus the unified
/// resolution cache. All key lookups are case-insensitive; every operation
/// is a short, complete transaction.
pub trait CanonicalStore: Send + Sync {
    /// Asset id for a listed ticker, if mirrored locally.
    fn lookup_by_ticker(&self, ticker: &str) -> Result<Option<CanonicalId>, EngineError>;

    /// Asset id for a known alias text, if mirrored locally.
    fn lookup_by_alias(&self, text: &str) -> Result<Option<CanonicalId>, EngineError>;

    fn upsert_asset(&self, asset: &CanonicalAsset) -> Result<(), EngineError>;
    fn upsert_listing(&self, listing: &Listing) -> Result<(), EngineError>;
    fn upsert_alias(&self, alias: &Alias) -> Result<(), EngineError>;

    /// Fetch a cache entry. An expired entry is deleted transparently and
    /// reported as a miss.
    fn get_cache_entry(
        &self,
        key: &str,
        kind: AliasType,
    ) -> Result<Option<ResolutionCacheEntry>, EngineError>;

    /// Atomic replace on the `(alias_key, alias_kind)` unique key; never
    /// produces duplicates.
    fn put_cache_entry(&self, entry: &ResolutionCacheEntry) -> Result<(), EngineError>;

    /// Delete all expired cache entries, returning how many were removed.
    fn purge_expired(&self) -> Result<usize, EngineError>;

    /// True if any mirrored identity domain was never synced, or was last
    /// synced longer ago than `max_age`.
    fn is_stale(&self, max_age: Duration) -> Result<bool, EngineError>;

    fn mark_synced(&self, domain: &str, at: DateTime<Utc>) -> Result<(), EngineError>;
}
