use canonid::cli::commands::{Cli, Commands};
use canonid::domain::entities::resolution::ResolutionRequest;
use canonid::Canonid;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("canonid=info")),
        )
        .init();

    let cli = Cli::parse();
    let db_path = std::env::var("CANONID_DB").unwrap_or_else(|_| "./canonid.db".into());

    let engine = match Canonid::new(&db_path) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error initializing canonid: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_command(engine, cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_command(engine: Canonid, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Resolve {
            ticker,
            name,
            id,
            weight,
        } => {
            let mut request = ResolutionRequest::new(ticker, name, weight);
            if let Some(id) = id {
                request = request.with_provider_id(id);
            }
            let result = engine.resolve(request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Batch { path } => {
            let text = if path == "-" {
                std::io::read_to_string(std::io::stdin())?
            } else {
                std::fs::read_to_string(&path)?
            };
            let rows: Vec<serde_json::Value> = serde_json::from_str(&text)?;
            let requests = rows
                .iter()
                .map(|row| {
                    let ticker = row["ticker"].as_str().unwrap_or_default();
                    let name = row["name"].as_str().unwrap_or_default();
                    let weight = row["weight"].as_f64().unwrap_or(0.0);
                    let mut request = ResolutionRequest::new(ticker, name, weight);
                    if let Some(id) = row["id"].as_str() {
                        request = request.with_provider_id(id);
                    }
                    request
                })
                .collect();
            let report = engine.batch_resolve(requests).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Sync => {
            let report = engine.sync().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Purge => {
            let removed = engine.purge_expired()?;
            println!("Purged {removed} expired cache entries");
        }
        Commands::FormatStats => {
            let stats = engine.format_stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::PruneLog { days } => {
            let removed = engine.prune_format_log(days)?;
            println!("Pruned {removed} format log entries");
        }
    }
    Ok(())
}
