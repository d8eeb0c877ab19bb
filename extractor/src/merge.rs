use log::info;

use crate::error::Result;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    /// Rows read from the source.
    pub read: usize,
    /// Rows that were new to the destination.
    pub inserted: usize,
}

impl MergeReport {
    pub fn duplicates(&self) -> usize {
        self.read - self.inserted
    }
}

/// Copy every row of `source` that `destination` does not have yet.
///
/// Ids already present in the destination are skipped. Any other failure
/// aborts the merge.
pub fn merge_stores(source: &Store, destination: &Store) -> Result<MergeReport> {
    destination.ensure_schema()?;

    let records = source.records()?;
    let inserted = destination.insert_records(&records)?;

    let report = MergeReport {
        read: records.len(),
        inserted,
    };
    info!(
        "Merged {} new rows ({} already present) from {} into {}",
        report.inserted,
        report.duplicates(),
        source.config().path.display(),
        destination.config().path.display()
    );
    Ok(report)
}
