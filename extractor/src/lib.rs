// Export the extractor modules
pub mod archive;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod merge;
pub mod pipeline;
pub mod snapshot;
pub mod store;

// Re-export tests for integration testing
#[cfg(test)]
pub mod tests;

// Re-export key types and functions for easier access
pub use crate::archive::{archive_file_name, save_snapshot, Archiver};
pub use crate::config::{ExtractConfig, FetcherConfig, RetryPolicy, StoreConfig};
pub use crate::error::{ExtractError, Result};
pub use crate::fetcher::{
    BanNotice, Fetcher, HttpResponse, ReqwestTransport, Sleeper, ThreadSleeper, TickerSource,
    Transport,
};
pub use crate::merge::{merge_stores, MergeReport};
pub use crate::pipeline::{BackfillSummary, Extractor, RunOutcome};
pub use crate::snapshot::{DateKey, TickerRecord, TickerSnapshot};
pub use crate::store::{InsertOutcome, Store, StoredRecord};
