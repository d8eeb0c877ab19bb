use std::collections::BTreeSet;
use std::path::PathBuf;

use log::{error, info};

use crate::archive::Archiver;
use crate::config::ExtractConfig;
use crate::error::Result;
use crate::fetcher::{Fetcher, TickerSource};
use crate::snapshot::DateKey;
use crate::store::{InsertOutcome, Store};

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The store already had this date; nothing was fetched.
    AlreadyPresent,
    Inserted { archive: PathBuf },
    /// Another writer got there between the existence check and the insert.
    Duplicate { archive: PathBuf },
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct BackfillSummary {
    pub skipped: Vec<DateKey>,
    pub inserted: Vec<DateKey>,
    pub duplicates: Vec<DateKey>,
    pub failed: Vec<(DateKey, String)>,
}

impl BackfillSummary {
    fn record(&mut self, date: DateKey, outcome: &RunOutcome) {
        match outcome {
            RunOutcome::AlreadyPresent => self.skipped.push(date),
            RunOutcome::Inserted { .. } => self.inserted.push(date),
            RunOutcome::Duplicate { .. } => self.duplicates.push(date),
        }
    }

    pub fn total(&self) -> usize {
        self.skipped.len() + self.inserted.len() + self.duplicates.len() + self.failed.len()
    }
}

/// Fetch, archive, store for one date or a range of dates.
pub struct Extractor<S = Fetcher> {
    source: S,
    archiver: Archiver,
    store: Store,
    exclude_symbols: BTreeSet<String>,
}

impl Extractor {
    pub fn from_config(config: &ExtractConfig) -> Result<Self> {
        Ok(Extractor::new(
            Fetcher::from_config(&config.fetcher)?,
            Archiver::new(&config.archive_dir),
            Store::new(config.store.clone()),
            config.exclude_symbols.clone(),
        ))
    }
}

impl<S: TickerSource> Extractor<S> {
    pub fn new(
        source: S,
        archiver: Archiver,
        store: Store,
        exclude_symbols: BTreeSet<String>,
    ) -> Self {
        Self {
            source,
            archiver,
            store,
            exclude_symbols,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn archiver(&self) -> &Archiver {
        &self.archiver
    }

    pub fn run_for_date(&self, date: DateKey) -> Result<RunOutcome> {
        if self.store.exists(date)? {
            info!("Data for {} already exists. Skipping.", date);
            return Ok(RunOutcome::AlreadyPresent);
        }

        info!("Fetching and processing data for {}...", date);
        let snapshot = self.source.fetch()?.without_symbols(&self.exclude_symbols);

        // The file goes first so a failed insert still leaves something to recover from.
        let archive = self.archiver.save(&snapshot, date)?;

        let outcome = match self.store.insert(date, &snapshot)? {
            InsertOutcome::Inserted => RunOutcome::Inserted { archive },
            InsertOutcome::Duplicate => RunOutcome::Duplicate { archive },
        };
        info!("Completed processing for {}", date);
        Ok(outcome)
    }

    pub fn run_today(&self) -> Result<RunOutcome> {
        self.run_for_date(DateKey::today_utc())
    }

    /// Run every date in `[start, end]`. A failed date is logged and recorded in
    /// the summary; only a fatal error stops the loop. An empty range does nothing.
    pub fn backfill_range(&self, start: DateKey, end: DateKey) -> Result<BackfillSummary> {
        if start > end {
            info!("Nothing to backfill: {} is after {}", start, end);
            return Ok(BackfillSummary::default());
        }

        info!("Starting backfill from {} to {}...", start, end);
        let mut summary = BackfillSummary::default();

        for date in DateKey::range_inclusive(start, end) {
            info!("Checking {}...", date);
            match self.run_for_date(date) {
                Ok(outcome) => summary.record(date, &outcome),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!("Failed on {}: {}", date, e);
                    summary.failed.push((date, e.to_string()));
                }
            }
        }

        info!(
            "Backfill finished: {} inserted, {} skipped, {} duplicates, {} failed",
            summary.inserted.len(),
            summary.skipped.len(),
            summary.duplicates.len(),
            summary.failed.len()
        );
        Ok(summary)
    }
}
