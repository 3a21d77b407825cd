use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "canonid", about = "Security identity resolution and caching engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve one identifier
    Resolve {
        /// Ticker symbol as supplied by the data source
        ticker: String,
        /// Issuer name, free text
        #[arg(long, default_value = "")]
        name: String,
        /// Provider-supplied canonical id, used when checksum-valid
        #[arg(long)]
        id: Option<String>,
        /// Portfolio weight in percent; at or below the tier threshold
        /// the external cascade is skipped
        #[arg(long, default_value_t = 100.0)]
        weight: f64,
    },
    /// Resolve a JSON array of {ticker, name, weight, id?} rows
    Batch {
        /// Path to the JSON file, or '-' for stdin
        path: String,
    },
    /// Mirror the registry identity domain into the local store
    Sync,
    /// Delete expired resolution-cache entries
    Purge,
    /// Success rate by (provider, ticker format)
    FormatStats,
    /// Delete format log entries older than the given age
    PruneLog {
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
}
