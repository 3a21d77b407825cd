use crate::domain::error::EngineError;
use crate::domain::values::ticker_format::TickerFormat;
use serde::Serialize;

/// Success rate of one (provider, format) pair.
#[derive(Debug, Clone, Serialize)]
pub struct FormatStat {
    pub provider: String,
    pub format: TickerFormat,
    pub attempts: usize,
    pub successes: usize,
}

impl FormatStat {
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }
}

/// Passive attempt logger. Classifies each variant's format before storing
/// and aggregates success rates per (provider, format) for offline tuning.
/// Never consulted by the cascade.
pub trait FormatObserver: Send + Sync {
    fn record(
        &self,
        raw_ticker: &str,
        variant: &str,
        provider: &str,
        succeeded: bool,
        context_id: Option<&str>,
    ) -> Result<(), EngineError>;

    fn aggregate_stats(&self) -> Result<Vec<FormatStat>, EngineError>;

    /// Delete entries older than `days`, returning how many were removed.
    fn prune_older_than(&self, days: i64) -> Result<usize, EngineError>;
}
