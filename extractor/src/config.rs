use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;

pub const DEFAULT_ENDPOINT: &str = "https://api.binance.us/api/v3/ticker/24hr";
pub const DEFAULT_SCHEMA: &str = "raw";
pub const DEFAULT_TABLE: &str = "raw_binance_us_24hr_ticker";
pub const DEFAULT_STORE_FILE: &str = "blockstream.duckdb";
pub const DEFAULT_ARCHIVE_SUBDIR: &str = "raw_json/binance_us";

// XRPUSD is listed twice upstream
pub const DEFAULT_EXCLUDED_SYMBOLS: &[&str] = &["XRPUSD"];

/// Where the raw table lives.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub schema: String,
    pub table: String,
}

impl StoreConfig {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            schema: DEFAULT_SCHEMA.to_string(),
            table: DEFAULT_TABLE.to_string(),
        }
    }

    pub fn with_table(mut self, schema: &str, table: &str) -> Self {
        self.schema = schema.to_string();
        self.table = table.to_string();
        self
    }

    pub fn quoted_schema(&self) -> String {
        quote_ident(&self.schema)
    }

    /// `"schema"."table"`, safe to splice into SQL.
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Waits applied by the fetcher between attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub network_delay: Duration,
    pub unexpected_status_delay: Duration,
    pub backoff_cap: Duration,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
    /// `None` retries forever; a ban still ends the loop.
    pub max_retries: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            network_delay: Duration::from_secs(10),
            unexpected_status_delay: Duration::from_secs(15),
            backoff_cap: Duration::from_secs(60),
            jitter_min: Duration::from_secs(1),
            jitter_max: Duration::from_secs(2),
            max_retries: None,
        }
    }
}

impl RetryPolicy {
    /// `min(2^retry_count + jitter, cap)`, all in seconds.
    pub fn rate_limit_delay(&self, retry_count: u32, jitter: Duration) -> Duration {
        let exponential = 2f64.powi(retry_count.min(32) as i32);
        let secs = (exponential + jitter.as_secs_f64()).min(self.backoff_cap.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Uniform over `[jitter_min, jitter_max]`.
    pub fn sample_jitter(&self) -> Duration {
        let min = self.jitter_min.as_secs_f64();
        let max = self.jitter_max.as_secs_f64();
        if max <= min {
            return self.jitter_min;
        }
        Duration::from_secs_f64(rand::thread_rng().gen_range(min..=max))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetcherConfig {
    pub endpoint: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Everything the extractor needs, assembled by the binary.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    pub store: StoreConfig,
    pub archive_dir: PathBuf,
    pub fetcher: FetcherConfig,
    pub exclude_symbols: BTreeSet<String>,
}

impl ExtractConfig {
    /// Default layout under a single data directory:
    /// `<data_dir>/blockstream.duckdb` and `<data_dir>/raw_json/binance_us/`.
    pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            store: StoreConfig::new(data_dir.join(DEFAULT_STORE_FILE)),
            archive_dir: data_dir.join(DEFAULT_ARCHIVE_SUBDIR),
            fetcher: FetcherConfig::default(),
            exclude_symbols: DEFAULT_EXCLUDED_SYMBOLS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
