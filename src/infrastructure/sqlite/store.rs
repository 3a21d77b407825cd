use crate::domain::entities::asset::{Alias, CanonicalAsset, Listing};
use crate::domain::entities::cache_entry::{CacheStatus, ResolutionCacheEntry};
use crate::domain::error::EngineError;
use crate::domain::ports::canonical_store::CanonicalStore;
use crate::domain::values::alias_type::AliasType;
use crate::domain::values::asset_class::AssetClass;
use crate::domain::values::canonical_id::CanonicalId;
use crate::domain::values::confidence::Confidence;
use crate::domain::values::source::Source;
use crate::infrastructure::sqlite::migrations::run_migrations;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;
use tracing::warn;

/// Identity domains tracked by `sync_meta`.
pub const SYNC_DOMAINS: [&str; 3] = ["assets", "listings", "aliases"];

pub struct SqliteCanonicalStore {
    conn: Mutex<Connection>,
}

impl SqliteCanonicalStore {
    /// Open (or create) the store at `path`. `:memory:` is accepted for
    /// tests.
    pub fn open(path: &str) -> Result<Self, EngineError> {
        let conn = Connection::open(path)
            .map_err(|e| EngineError::Storage(format!("DB error: {e}")))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| EngineError::Storage(format!("WAL error: {e}")))?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn new(conn: Connection) -> Result<Self, EngineError> {
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_cache_entry(row: &rusqlite::Row) -> Result<ResolutionCacheEntry, rusqlite::Error> {
        let key: String = row.get(0)?;
        let kind_str: String = row.get(1)?;
        let id_str: Option<String> = row.get(2)?;
        let status_str: String = row.get(3)?;
        let confidence_val: f64 = row.get(4)?;
        let source_str: Option<String> = row.get(5)?;
        let created_str: String = row.get(6)?;
        let expires_str: Option<String> = row.get(7)?;

        Ok(ResolutionCacheEntry {
            alias_key: key,
            alias_kind: kind_str.parse().unwrap_or_else(|_| {
                warn!("Invalid alias kind '{kind_str}' in cache, defaulting to ticker");
                AliasType::Ticker
            }),
            resolved_id: id_str.and_then(|s| match CanonicalId::parse(&s) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!("Dropping corrupt cached id: {e}");
                    None
                }
            }),
            status: status_str.parse().unwrap_or(CacheStatus::Unresolved),
            confidence: Confidence::new(confidence_val).unwrap_or_default(),
            source: source_str.and_then(|s| s.parse::<Source>().ok()),
            created_at: parse_ts(&created_str),
            expires_at: expires_str.map(|s| parse_ts(&s)),
        })
    }
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl CanonicalStore for SqliteCanonicalStore {
    fn lookup_by_ticker(&self, ticker: &str) -> Result<Option<CanonicalId>, EngineError> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Ok(None);
        }
        let conn = self
            .conn
            .lock()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        let id_str: Option<String> = conn
            .query_row(
                "SELECT asset_id FROM listings WHERE ticker = ?1 LIMIT 1",
                params![ticker],
                |r| r.get(0),
            )
            .optional()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(id_str.and_then(|s| CanonicalId::parse(&s).ok()))
    }

    fn lookup_by_alias(&self, text: &str) -> Result<Option<CanonicalId>, EngineError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let conn = self
            .conn
            .lock()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        let id_str: Option<String> = conn
            .query_row(
                "SELECT asset_id FROM aliases WHERE alias_text = ?1 LIMIT 1",
                params![text],
                |r| r.get(0),
            )
            .optional()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(id_str.and_then(|s| CanonicalId::parse(&s).ok()))
    }

    fn upsert_asset(&self, asset: &CanonicalAsset) -> Result<(), EngineError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT INTO assets (id, display_name, asset_class, base_currency, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 display_name = excluded.display_name,
                 asset_class = excluded.asset_class,
                 base_currency = excluded.base_currency",
            params![
                asset.id.as_str(),
                asset.display_name,
                asset.asset_class.to_string(),
                asset.base_currency,
                asset.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| EngineError::Storage(format!("Failed to upsert asset: {e}")))?;
        Ok(())
    }

    fn upsert_listing(&self, listing: &Listing) -> Result<(), EngineError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT INTO listings (ticker, exchange, asset_id, trading_currency)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(ticker, exchange) DO UPDATE SET
                 asset_id = excluded.asset_id,
                 trading_currency = excluded.trading_currency",
            params![
                listing.ticker,
                listing.exchange,
                listing.asset_id.as_str(),
                listing.trading_currency,
            ],
        )
        .map_err(|e| EngineError::Storage(format!("Failed to upsert listing: {e}")))?;
        Ok(())
    }

    fn upsert_alias(&self, alias: &Alias) -> Result<(), EngineError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT INTO aliases (alias_text, alias_type, asset_id, contributor_count)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(alias_text, asset_id) DO UPDATE SET
                 alias_type = excluded.alias_type,
                 contributor_count = MAX(aliases.contributor_count, excluded.contributor_count)",
            params![
                alias.text,
                alias.alias_type.to_string(),
                alias.asset_id.as_str(),
                alias.contributor_count,
            ],
        )
        .map_err(|e| EngineError::Storage(format!("Failed to upsert alias: {e}")))?;
        Ok(())
    }

    fn get_cache_entry(
        &self,
        key: &str,
        kind: AliasType,
    ) -> Result<Option<ResolutionCacheEntry>, EngineError> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(None);
        }
        let conn = self
            .conn
            .lock()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        let entry = conn
            .query_row(
                "SELECT alias_key, alias_kind, resolved_id, status, confidence, source,
                        created_at, expires_at
                 FROM resolution_cache WHERE alias_key = ?1 AND alias_kind = ?2",
                params![key, kind.to_string()],
                Self::row_to_cache_entry,
            )
            .optional()
            .map_err(|e| EngineError::Storage(e.to_string()))?;

        match entry {
            Some(entry) if entry.is_expired(Utc::now()) => {
                // Expired entries are reaped on read so the next resolution
                // re-runs the cascade instead of trusting stale failure.
                conn.execute(
                    "DELETE FROM resolution_cache WHERE alias_key = ?1 AND alias_kind = ?2",
                    params![key, kind.to_string()],
                )
                .map_err(|e| EngineError::Storage(e.to_string()))?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn put_cache_entry(&self, entry: &ResolutionCacheEntry) -> Result<(), EngineError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO resolution_cache
                 (alias_key, alias_kind, resolved_id, status, confidence, source,
                  created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.alias_key,
                entry.alias_kind.to_string(),
                entry.resolved_id.as_ref().map(|id| id.as_str().to_string()),
                entry.status.to_string(),
                entry.confidence.value(),
                entry.source.map(|s| s.to_string()),
                entry.created_at.to_rfc3339(),
                entry.expires_at.map(|t| t.to_rfc3339()),
            ],
        )
        .map_err(|e| EngineError::Storage(format!("Failed to write cache entry: {e}")))?;
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize, EngineError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        let removed = conn
            .execute(
                "DELETE FROM resolution_cache
                 WHERE expires_at IS NOT NULL AND expires_at < ?1",
                params![Utc::now().to_rfc3339()],
            )
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(removed)
    }

    fn is_stale(&self, max_age: Duration) -> Result<bool, EngineError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        let now = Utc::now();
        for domain in SYNC_DOMAINS {
            let synced: Option<String> = conn
                .query_row(
                    "SELECT synced_at FROM sync_meta WHERE domain = ?1",
                    params![domain],
                    |r| r.get(0),
                )
                .optional()
                .map_err(|e| EngineError::Storage(e.to_string()))?;
            match synced {
                None => return Ok(true),
                Some(at) if now - parse_ts(&at) > max_age => return Ok(true),
                Some(_) => {}
            }
        }
        Ok(false)
    }

    fn mark_synced(&self, domain: &str, at: DateTime<Utc>) -> Result<(), EngineError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO sync_meta (domain, synced_at) VALUES (?1, ?2)",
            params![domain, at.to_rfc3339()],
        )
        .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(())
    }
}

/// Seed the mirror with one externally-learned fact: the asset row, the
/// listing, and optionally an alias, in one call. Used by write-through
/// after registry/provider hits.
pub fn record_identity(
    store: &dyn CanonicalStore,
    id: &CanonicalId,
    display_name: &str,
    asset_class: AssetClass,
    ticker: &str,
    alias: Option<&Alias>,
) -> Result<(), EngineError> {
    store.upsert_asset(&CanonicalAsset::new(
        id.clone(),
        display_name.to_string(),
        asset_class,
        "USD".to_string(),
    ))?;
    if !ticker.trim().is_empty() {
        store.upsert_listing(&Listing::new(ticker, "UNKNOWN", id.clone(), "USD"))?;
    }
    if let Some(alias) = alias {
        store.upsert_alias(alias)?;
    }
    Ok(())
}
