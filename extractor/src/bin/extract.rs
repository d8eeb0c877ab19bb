use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use daily_ticker_extractor::config::DEFAULT_ENDPOINT;
use daily_ticker_extractor::{DateKey, ExtractConfig, ExtractError, Extractor, RunOutcome};
use env_logger::Env;
use log::{error, info};

/// Fetch the daily 24hr ticker snapshot into the raw JSON archive and DuckDB
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding blockstream.duckdb and raw_json/
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Ticker statistics endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Date key to extract (YYYYMMDD), defaults to today in UTC
    #[arg(long, value_parser = parse_date_key)]
    date: Option<DateKey>,

    /// First date of a backfill (YYYYMMDD)
    #[arg(long, value_parser = parse_date_key)]
    backfill_from: Option<DateKey>,

    /// Last date of a backfill (YYYYMMDD), defaults to today in UTC
    #[arg(long, value_parser = parse_date_key, requires = "backfill_from")]
    backfill_to: Option<DateKey>,

    /// Symbols dropped before archiving, comma separated. Pass "" to keep all.
    #[arg(long, value_delimiter = ',', default_value = "XRPUSD")]
    exclude: Vec<String>,

    /// Give up after this many retries instead of retrying forever
    #[arg(long)]
    max_retries: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

fn parse_date_key(s: &str) -> std::result::Result<DateKey, String> {
    s.parse::<DateKey>().map_err(|e| e.to_string())
}

impl Cli {
    fn to_config(&self) -> ExtractConfig {
        let mut config = ExtractConfig::with_data_dir(&self.data_dir);
        config.fetcher.endpoint = self.endpoint.clone();
        config.fetcher.request_timeout = Duration::from_secs(self.timeout_secs);
        config.fetcher.retry.max_retries = self.max_retries;
        config.exclude_symbols = self
            .exclude
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        config
    }
}

fn run(cli: &Cli, extractor: &Extractor) -> std::result::Result<(), ExtractError> {
    let today = DateKey::today_utc();

    if let Some(start) = cli.backfill_from {
        let summary = extractor.backfill_range(start, cli.backfill_to.unwrap_or(today))?;
        for (date, reason) in &summary.failed {
            error!("  {} failed: {}", date, reason);
        }
    }

    let date = cli.date.unwrap_or(today);
    info!("Starting extraction for date: {}", date);
    match extractor.run_for_date(date)? {
        RunOutcome::AlreadyPresent => {
            info!("Data for {} already exists, skipping extraction.", date)
        }
        RunOutcome::Inserted { archive } | RunOutcome::Duplicate { archive } => {
            info!("Extraction and write complete ({}).", archive.display())
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.to_config();

    let extractor = Extractor::from_config(&config).context("Failed to create extractor")?;
    extractor.store().ensure_schema().with_context(|| {
        format!(
            "Failed to prepare store at {}",
            config.store.path.display()
        )
    })?;

    match run(&cli, &extractor) {
        Ok(()) => Ok(()),
        Err(ExtractError::Banned(notice)) => {
            error!("Stopping: {}", notice);
            std::process::exit(1);
        }
        Err(e) => Err(e).context("Extraction failed"),
    }
}
