use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS assets (
            id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            asset_class TEXT NOT NULL DEFAULT 'other',
            base_currency TEXT NOT NULL DEFAULT 'USD',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS listings (
            ticker TEXT NOT NULL COLLATE NOCASE,
            exchange TEXT NOT NULL,
            asset_id TEXT NOT NULL,
            trading_currency TEXT NOT NULL DEFAULT 'USD',
            PRIMARY KEY (ticker, exchange)
        );

        CREATE TABLE IF NOT EXISTS aliases (
            alias_text TEXT NOT NULL COLLATE NOCASE,
            alias_type TEXT NOT NULL DEFAULT 'name',
            asset_id TEXT NOT NULL,
            contributor_count INTEGER NOT NULL DEFAULT 1,
            UNIQUE (alias_text, asset_id)
        );

        CREATE TABLE IF NOT EXISTS resolution_cache (
            alias_key TEXT NOT NULL COLLATE NOCASE,
            alias_kind TEXT NOT NULL,
            resolved_id TEXT,
            status TEXT NOT NULL,
            confidence REAL NOT NULL DEFAULT 0.0,
            source TEXT,
            created_at TEXT NOT NULL,
            expires_at TEXT,
            UNIQUE (alias_key, alias_kind)
        );

        CREATE TABLE IF NOT EXISTS format_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            raw_ticker TEXT NOT NULL,
            variant_tried TEXT NOT NULL,
            detected_format TEXT NOT NULL,
            provider TEXT NOT NULL,
            succeeded INTEGER NOT NULL,
            context_id TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sync_meta (
            domain TEXT PRIMARY KEY,
            synced_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_listings_ticker ON listings(ticker);
        CREATE INDEX IF NOT EXISTS idx_aliases_text ON aliases(alias_text);
        CREATE INDEX IF NOT EXISTS idx_cache_expires ON resolution_cache(expires_at);
        CREATE INDEX IF NOT EXISTS idx_format_log_created ON format_log(created_at);
        ",
    )
    .map_err(|e| format!("Migration failed: {e}"))
}
