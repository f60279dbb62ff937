// src/main.rs
mod balance;
mod config;
mod edinet;
mod extractors;
mod pipeline;
mod reference;
mod storage;
mod utils;

use clap::Parser;
use config::Config;
use edinet::{DisclosureApi, EdinetClient};
use pipeline::{run_all, Pipeline, RequestOutcome};
use reference::ReferenceTableProvider;
use std::path::PathBuf;
use std::sync::Arc;
use storage::CacheStore;
use utils::AppError;

/// Command Line Interface for the EDINET balance-sheet extractor
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Securities code of the company (e.g. 7203). Repeat to compare companies.
    #[arg(short, long, required = true)]
    ticker: Vec<String>,

    /// EDINET API subscription key
    #[arg(long, env = "EDINET_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Directory holding the cached EDINET code list
    #[arg(short, long, default_value = ".")]
    cache_dir: PathBuf,

    /// Pretty-print the JSON result
    #[arg(short, long)]
    pretty: bool,

    /// Log per-day index and per-fact detail (ignored when RUST_LOG is set)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (RUST_LOG overrides --verbose)
    utils::logging::setup_logging(if args.verbose {
        "edinet_extractor=debug,info"
    } else {
        "info"
    });
    tracing::info!("Starting processing for tickers: {:?}", args.ticker);

    if args.api_key.trim().is_empty() {
        return Err(AppError::Config("EDINET API key is empty".to_string()));
    }
    let config = Config::new(args.api_key.trim(), &args.cache_dir);

    // 3. Shared collaborators; only the code list is shared across tickers
    let api: Arc<dyn DisclosureApi> = Arc::new(EdinetClient::new(&config)?);
    let reference = Arc::new(ReferenceTableProvider::new(
        api.clone(),
        CacheStore::new(config.reference_cache_path()),
    ));
    let pipeline = Arc::new(Pipeline::new(api, reference, config.search_window_days));

    // 4. Run
    let today = chrono::Local::now().date_naive();
    let results = run_all(pipeline, args.ticker, today).await;

    let success_count = results.iter().filter(|(_, o)| o.is_success()).count();
    let failure_count = results.len() - success_count;
    for (ticker, outcome) in &results {
        match outcome {
            RequestOutcome::Summary(summary) => tracing::info!(
                "{} ({}): equity ratio {}, current ratio {}",
                ticker,
                summary.company_name,
                format_ratio(summary.equity_ratio()),
                format_ratio(summary.current_ratio())
            ),
            RequestOutcome::Failure { error, .. } => tracing::error!("{}: {}", ticker, error),
        }
    }

    // 5. Emit JSON: a single outcome, or an object keyed by ticker
    let output = if results.len() == 1 {
        serde_json::to_value(&results[0].1)?
    } else {
        let mut map = serde_json::Map::new();
        for (ticker, outcome) in &results {
            map.insert(ticker.clone(), serde_json::to_value(outcome)?);
        }
        serde_json::Value::Object(map)
    };
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", rendered);

    tracing::info!("Processing finished. Success: {}, Failures: {}", success_count, failure_count);

    if success_count == 0 && failure_count > 0 {
        return Err(AppError::Processing(format!(
            "No balance sheet could be produced for {} ticker(s)",
            failure_count
        )));
    }

    Ok(())
}

fn format_ratio(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "n/a".to_string(), |r| format!("{:.1}%", r))
}
