use std::fs;

use anyhow::Result;
use serde_json::Value;
use tempfile::tempdir;

use super::fixtures;
use crate::archive::{archive_file_name, save_snapshot, Archiver};
use crate::snapshot::TickerSnapshot;

#[test]
fn test_save_raw_json() -> Result<()> {
    let dir = tempdir()?;
    let date = fixtures::date("20250720");

    let path = save_snapshot(&fixtures::sample_snapshot(), date, dir.path())?;

    assert_eq!(path, dir.path().join("daily_24hr_ticker_20250720.json"));
    assert!(path.exists());

    let content: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    let records = content.as_array().expect("archive should hold an array");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["symbol"], "BTCUSDT");
    assert_eq!(records[0]["priceChange"], "100");
    assert_eq!(records[0]["lastPrice"], "20000");
    Ok(())
}

#[test]
fn test_archive_is_indented_and_round_trips() -> Result<()> {
    let dir = tempdir()?;
    let archiver = Archiver::new(dir.path());
    let date = fixtures::date("20240101");
    let snapshot = fixtures::mixed_snapshot();

    let path = archiver.save(&snapshot, date)?;

    let text = fs::read_to_string(&path)?;
    assert!(text.contains("\n  {"));
    assert_eq!(TickerSnapshot::from_json(&text)?, snapshot);
    assert_eq!(archiver.load(date)?, snapshot);
    Ok(())
}

#[test]
fn test_creates_missing_directories() -> Result<()> {
    let dir = tempdir()?;
    let nested = dir.path().join("raw_json").join("binance_us");
    let archiver = Archiver::new(&nested);

    archiver.save(&fixtures::sample_snapshot(), fixtures::date("20250720"))?;

    assert!(nested.join(archive_file_name(fixtures::date("20250720"))).exists());
    Ok(())
}

#[test]
fn test_rerun_overwrites() -> Result<()> {
    let dir = tempdir()?;
    let archiver = Archiver::new(dir.path());
    let date = fixtures::date("20250720");

    archiver.save(&fixtures::mixed_snapshot(), date)?;
    archiver.save(&fixtures::sample_snapshot(), date)?;

    assert_eq!(archiver.load(date)?, fixtures::sample_snapshot());
    assert_eq!(fs::read_dir(dir.path())?.count(), 1);
    Ok(())
}

#[test]
fn test_save_fails_when_base_is_a_file() -> Result<()> {
    let dir = tempdir()?;
    let blocker = dir.path().join("not_a_dir");
    fs::write(&blocker, "x")?;

    let result = save_snapshot(&fixtures::sample_snapshot(), fixtures::date("20250720"), &blocker);
    assert!(result.is_err());
    Ok(())
}
