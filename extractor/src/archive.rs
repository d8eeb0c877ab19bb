use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::Result;
use crate::snapshot::{DateKey, TickerSnapshot};

pub fn archive_file_name(date: DateKey) -> String {
    format!("daily_24hr_ticker_{}.json", date)
}

/// Write `snapshot` as indented JSON under `base_dir`, creating the directory
/// if needed. An existing file for the same date is replaced.
pub fn save_snapshot(snapshot: &TickerSnapshot, date: DateKey, base_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(base_dir)?;

    let file_path = base_dir.join(archive_file_name(date));
    fs::write(&file_path, snapshot.to_pretty_json()?)?;

    info!("Saved raw data to {}", file_path.display());
    Ok(file_path)
}

/// Raw JSON archive rooted at one directory.
#[derive(Debug, Clone)]
pub struct Archiver {
    base_dir: PathBuf,
}

impl Archiver {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn path_for(&self, date: DateKey) -> PathBuf {
        self.base_dir.join(archive_file_name(date))
    }

    pub fn save(&self, snapshot: &TickerSnapshot, date: DateKey) -> Result<PathBuf> {
        save_snapshot(snapshot, date, &self.base_dir)
    }

    /// Read back an archived snapshot, e.g. to replay a failed store write.
    pub fn load(&self, date: DateKey) -> Result<TickerSnapshot> {
        let text = fs::read_to_string(self.path_for(date))?;
        TickerSnapshot::from_json(&text)
    }
}
