use anyhow::{Context, Result};
use daily_ticker_extractor::{merge_stores, Store, StoreConfig};
use env_logger::Env;
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Get store paths from command line arguments
    let args: Vec<String> = env::args().collect();

    if args.len() != 3 {
        eprintln!("Please provide the destination and source store paths");
        eprintln!("Usage: cargo run --bin merge_artifacts <local_db_path> <new_db_path>");
        std::process::exit(1);
    }

    let local_db_path = Path::new(&args[1]);
    let new_db_path = Path::new(&args[2]);

    // Opening a missing file would silently create an empty store
    if !new_db_path.exists() {
        anyhow::bail!("Source store {} does not exist", new_db_path.display());
    }

    let destination = Store::new(StoreConfig::new(local_db_path));
    let source = Store::new(StoreConfig::new(new_db_path));

    let report = merge_stores(&source, &destination).with_context(|| {
        format!(
            "Failed to merge {} into {}",
            new_db_path.display(),
            local_db_path.display()
        )
    })?;

    println!(
        "Merged {} rows from {} into {} ({} already present)",
        report.inserted,
        new_db_path.display(),
        local_db_path.display(),
        report.duplicates()
    );

    Ok(())
}
