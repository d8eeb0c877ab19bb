use std::fs;
use std::path::Path;

use duckdb::Connection;

use crate::config::StoreConfig;
use crate::snapshot::{DateKey, TickerSnapshot};
use crate::store::Store;

/// Load test JSON fixture by name
pub fn load_json_fixture(fixture_name: &str) -> String {
    let path = Path::new("src/tests/fixtures").join(format!("{}.json", fixture_name));
    fs::read_to_string(path)
        .unwrap_or_else(|_| panic!("Failed to load test fixture: {}", fixture_name))
}

/// `[{"symbol":"BTCUSDT","priceChange":"100","lastPrice":"20000"}]`
pub fn sample_snapshot() -> TickerSnapshot {
    TickerSnapshot::from_json(&load_json_fixture("sample_ticker")).unwrap()
}

/// BTCUSDT, XRPUSD and ETHUSDT
pub fn mixed_snapshot() -> TickerSnapshot {
    TickerSnapshot::from_json(&load_json_fixture("mixed_ticker")).unwrap()
}

pub fn date(key: &str) -> DateKey {
    key.parse().unwrap()
}

/// A store whose default table has an `INT` id, with one row per key.
pub fn store_with_integer_ids(dir: &Path, file_name: &str, keys: &[u32]) -> Store {
    let store = store_with_table(
        dir,
        file_name,
        "id INT PRIMARY KEY, raw_response VARCHAR, created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP",
    );
    let conn = Connection::open(&store.config().path).unwrap();
    for key in keys {
        conn.execute(
            &format!(
                "INSERT INTO {} (id, raw_response) VALUES ({}, '[]')",
                store.config().qualified_table(),
                key
            ),
            [],
        )
        .unwrap();
    }
    store
}

/// A store whose default table was created by `columns` instead of `ensure_schema`.
pub fn store_with_table(dir: &Path, file_name: &str, columns: &str) -> Store {
    let config = StoreConfig::new(dir.join(file_name));
    let conn = Connection::open(&config.path).unwrap();
    conn.execute_batch(&format!(
        "CREATE SCHEMA {}; CREATE TABLE {} ({});",
        config.quoted_schema(),
        config.qualified_table(),
        columns
    ))
    .unwrap();
    Store::new(config)
}

/// A store file inside `dir` with its table already created.
pub fn temp_store(dir: &Path, file_name: &str) -> Store {
    Store::open(StoreConfig::new(dir.join(file_name))).unwrap()
}
