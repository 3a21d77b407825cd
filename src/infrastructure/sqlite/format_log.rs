use crate::domain::error::EngineError;
use crate::domain::normalize::detect_format;
use crate::domain::ports::format_observer::{FormatObserver, FormatStat};
use crate::domain::values::ticker_format::TickerFormat;
use crate::infrastructure::sqlite::migrations::run_migrations;
use chrono::{Duration, Utc};
use rusqlite::{params, Connection};
use std::sync::Mutex;

/// Append-only format log over the shared engine database.
pub struct SqliteFormatObserver {
    conn: Mutex<Connection>,
}

impl SqliteFormatObserver {
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
}

impl FormatObserver for SqliteFormatObserver {
    fn record(
        &self,
        raw_ticker: &str,
        variant: &str,
        provider: &str,
        succeeded: bool,
        context_id: Option<&str>,
    ) -> Result<(), EngineError> {
        let format = detect_format(variant);
        let conn = self
            .conn
            .lock()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT INTO format_log
                 (raw_ticker, variant_tried, detected_format, provider, succeeded,
                  context_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                raw_ticker,
                variant,
                format.to_string(),
                provider,
                succeeded as i32,
                context_id,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| EngineError::Storage(format!("Failed to record attempt: {e}")))?;
        Ok(())
    }

    fn aggregate_stats(&self) -> Result<Vec<FormatStat>, EngineError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        let mut stmt = conn
            .prepare(
                "SELECT provider, detected_format, COUNT(*), SUM(succeeded)
                 FROM format_log
                 GROUP BY provider, detected_format
                 ORDER BY provider, detected_format",
            )
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        let stats = stmt
            .query_map([], |row| {
                let format_str: String = row.get(1)?;
                Ok(FormatStat {
                    provider: row.get(0)?,
                    format: format_str.parse().unwrap_or(TickerFormat::Plain),
                    attempts: row.get::<_, i64>(2)? as usize,
                    successes: row.get::<_, i64>(3)? as usize,
                })
            })
            .map_err(|e| EngineError::Storage(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(stats)
    }

    fn prune_older_than(&self, days: i64) -> Result<usize, EngineError> {
        let cutoff = (Utc::now() - Duration::days(days)).to_rfc3339();
        let conn = self
            .conn
            .lock()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        let removed = conn
            .execute(
                "DELETE FROM format_log WHERE created_at < ?1",
                params![cutoff],
            )
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(removed)
    }
}
