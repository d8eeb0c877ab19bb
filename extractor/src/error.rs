use thiserror::Error;

use crate::fetcher::BanNotice;

pub type Result<T> = std::result::Result<T, ExtractError>;

#[derive(Error, Debug)]
pub enum ExtractError {
    /// The upstream answered 418. Nothing may be retried after this.
    #[error("{0}")]
    Banned(BanNotice),

    #[error("gave up after {retries} retries, last failure: {last}")]
    RetriesExhausted { retries: u32, last: String },

    /// For [`Transport`](crate::fetcher::Transport) implementations that are not reqwest.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid ticker snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("invalid date key {0:?}, expected YYYYMMDD")]
    InvalidDateKey(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DuckDB error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Fatal errors end the whole process instead of a single date.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExtractError::Banned(_))
    }
}
