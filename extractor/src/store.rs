//! DuckDB store for raw daily snapshots.
//!
//! Every call opens its own connection and drops it before returning, so no
//! file lock is held between calls.

use std::fs;

use chrono::{NaiveDateTime, Utc};
use duckdb::{params, Connection};
use log::{info, warn};

use crate::config::StoreConfig;
use crate::error::Result;
use crate::snapshot::{DateKey, TickerSnapshot};

/// What happened to an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same id was already there and was left untouched.
    Duplicate,
}

/// One row of the raw table.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    pub raw_response: String,
    pub created_at: NaiveDateTime,
}

impl StoredRecord {
    pub fn new(date: DateKey, snapshot: &TickerSnapshot) -> Result<Self> {
        Ok(Self {
            id: date.to_string(),
            raw_response: snapshot.to_json()?,
            created_at: Utc::now().naive_utc(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    config: StoreConfig,
}

impl Store {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Create the store and make sure its table exists.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let store = Self::new(config);
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn connect(&self) -> Result<Connection> {
        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Connection::open(&self.config.path)?)
    }

    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(&format!(
            "CREATE SCHEMA IF NOT EXISTS {schema};
             CREATE TABLE IF NOT EXISTS {table} (
                 id VARCHAR PRIMARY KEY,
                 raw_response VARCHAR,
                 created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
             );",
            schema = self.config.quoted_schema(),
            table = self.config.qualified_table(),
        ))?;
        Ok(())
    }

    pub fn exists(&self, date: DateKey) -> Result<bool> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE id = ?",
                self.config.qualified_table()
            ),
            params![date.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn insert(&self, date: DateKey, snapshot: &TickerSnapshot) -> Result<InsertOutcome> {
        let record = StoredRecord::new(date, snapshot)?;
        let conn = self.connect()?;
        let outcome = insert_record(&conn, &self.config.qualified_table(), &record)?;

        match outcome {
            InsertOutcome::Inserted => info!(
                "Inserted raw data into {} with id={}",
                self.config.qualified_table(),
                record.id
            ),
            InsertOutcome::Duplicate => warn!(
                "Skipped insert: record with id={} already exists in {}",
                record.id,
                self.config.qualified_table()
            ),
        }

        Ok(outcome)
    }

    /// Insert many rows over one connection, skipping ids already present.
    /// Returns how many rows were actually added.
    pub fn insert_records(&self, records: &[StoredRecord]) -> Result<usize> {
        let conn = self.connect()?;
        let table = self.config.qualified_table();

        let mut inserted = 0;
        for record in records {
            if insert_record(&conn, &table, record)? == InsertOutcome::Inserted {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// All rows, ordered by id. Integer ids from older artifacts come back as text.
    pub fn records(&self) -> Result<Vec<StoredRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT CAST(id AS VARCHAR), raw_response, created_at FROM {} ORDER BY id",
            self.config.qualified_table()
        ))?;

        let records = stmt
            .query_map([], |row| {
                Ok(StoredRecord {
                    id: row.get(0)?,
                    raw_response: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.config.qualified_table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

// The primary key decides: a conflicting id inserts zero rows. Every other
// constraint failure still surfaces as an error.
fn insert_record(conn: &Connection, table: &str, record: &StoredRecord) -> Result<InsertOutcome> {
    let changed = conn.execute(
        &format!(
            "INSERT INTO {} (id, raw_response, created_at) VALUES (?, ?, ?)
             ON CONFLICT (id) DO NOTHING",
            table
        ),
        params![record.id, record.raw_response, record.created_at],
    )?;

    Ok(if changed == 0 {
        InsertOutcome::Duplicate
    } else {
        InsertOutcome::Inserted
    })
}
