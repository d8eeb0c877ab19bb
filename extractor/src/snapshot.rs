use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ExtractError, Result};

const DATE_KEY_FORMAT: &str = "%Y%m%d";

/// One per-symbol entry of the upstream response. The fields belong to the
/// exchange and are carried through untouched.
pub type TickerRecord = Map<String, Value>;

/// The full body of one 24hr ticker fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickerSnapshot(Vec<TickerRecord>);

impl TickerSnapshot {
    pub fn new(records: Vec<TickerRecord>) -> Self {
        Self(records)
    }

    /// Decode a response body. Anything other than an array of objects is rejected.
    pub fn from_json(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(ExtractError::InvalidSnapshot(format!(
                    "expected a JSON array, got {}",
                    json_kind(&other)
                )))
            }
        };

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(record) => Ok(record),
                other => Err(ExtractError::InvalidSnapshot(format!(
                    "element {} is {}, expected an object",
                    index,
                    json_kind(&other)
                ))),
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    /// Compact form, as stored in the `raw_response` column.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Indented form, as written to the archive.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }

    pub fn records(&self) -> &[TickerRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop every record whose `symbol` is in `excluded`. Records without a
    /// string `symbol` are kept.
    pub fn without_symbols(self, excluded: &BTreeSet<String>) -> Self {
        if excluded.is_empty() {
            return self;
        }

        let records = self
            .0
            .into_iter()
            .filter(|record| {
                record
                    .get("symbol")
                    .and_then(Value::as_str)
                    .map_or(true, |symbol| !excluded.contains(symbol))
            })
            .collect();

        Self(records)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Calendar day identifier, rendered as `YYYYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn today_utc() -> Self {
        Self(Utc::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Every day from `start` to `end`, both included. Empty when `start > end`.
    pub fn range_inclusive(start: DateKey, end: DateKey) -> impl Iterator<Item = DateKey> {
        start
            .0
            .iter_days()
            .take_while(move |day| *day <= end.0)
            .map(DateKey)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != 8 || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(ExtractError::InvalidDateKey(s.to_string()));
        }

        NaiveDate::parse_from_str(s, DATE_KEY_FORMAT)
            .map(Self)
            .map_err(|_| ExtractError::InvalidDateKey(s.to_string()))
    }
}
