//! Integration test: warehouse loading and CSV fallback

use std::path::Path;

use rusqlite::Connection;
use stress_analytics::data::{DataSource, SourceConfig, SqliteWarehouse, Warehouse};
use stress_analytics::error::AnalyticsError;
use tempfile::TempDir;

const TABLE: &str = "stress_level_dataset";

fn write_warehouse(path: &Path, rows: usize) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE {TABLE} (
            \"{TABLE}.anxiety_level\" INTEGER,
            \"{TABLE}.sleep_quality\" REAL,
            \"{TABLE}.stress_level\" INTEGER
        );"
    ))
    .unwrap();
    for i in 0..rows {
        conn.execute(
            &format!("INSERT INTO {TABLE} VALUES (?1, ?2, ?3)"),
            rusqlite::params![i as i64 * 2, 1.5 + i as f64, (i % 3) as i64],
        )
        .unwrap();
    }
}

fn write_csv(path: &Path, rows: usize) {
    let mut text = String::from("anxiety_level,self_esteem,stress_level\n");
    for i in 0..rows {
        text.push_str(&format!("{},{},{}\n", i, 30 - i, i % 3));
    }
    std::fs::write(path, text).unwrap();
}

fn source(dir: &TempDir, db: &str, csv: &str) -> DataSource {
    DataSource::from_config(&SourceConfig {
        warehouse_path: dir.path().join(db),
        table: TABLE.to_string(),
        fallback_csv: dir.path().join(csv),
        label_column: "stress_level".to_string(),
    })
}

#[test]
fn test_warehouse_columns_are_normalized() {
    let dir = TempDir::new().unwrap();
    write_warehouse(&dir.path().join("warehouse.db"), 9);

    let dataset = source(&dir, "warehouse.db", "missing.csv").load_dataset().unwrap();
    assert_eq!(dataset.n_rows(), 9);
    assert_eq!(
        dataset.column_names(),
        vec!["anxiety_level", "sleep_quality", "stress_level"]
    );
    assert!(dataset.is_integral("anxiety_level").unwrap());
    assert!(!dataset.is_integral("sleep_quality").unwrap());
    assert_eq!(dataset.labels("stress_level").unwrap()[..4], [0, 1, 2, 0]);
}

#[test]
fn test_warehouse_preferred_over_fallback() {
    let dir = TempDir::new().unwrap();
    write_warehouse(&dir.path().join("warehouse.db"), 6);
    write_csv(&dir.path().join("fallback.csv"), 12);

    let dataset = source(&dir, "warehouse.db", "fallback.csv").load_dataset().unwrap();
    assert_eq!(dataset.n_rows(), 6);
}

#[test]
fn test_missing_database_falls_back() {
    let dir = TempDir::new().unwrap();
    write_csv(&dir.path().join("fallback.csv"), 12);

    let dataset = source(&dir, "nope.db", "fallback.csv").load_dataset().unwrap();
    assert_eq!(dataset.n_rows(), 12);
    assert!(dataset.has_column("self_esteem"));
}

#[test]
fn test_missing_table_falls_back() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("warehouse.db");
    Connection::open(&db)
        .unwrap()
        .execute_batch("CREATE TABLE other (x INTEGER);")
        .unwrap();
    write_csv(&dir.path().join("fallback.csv"), 5);

    let dataset = source(&dir, "warehouse.db", "fallback.csv").load_dataset().unwrap();
    assert_eq!(dataset.n_rows(), 5);
}

#[test]
fn test_empty_table_falls_back() {
    let dir = TempDir::new().unwrap();
    write_warehouse(&dir.path().join("warehouse.db"), 0);
    write_csv(&dir.path().join("fallback.csv"), 7);

    let dataset = source(&dir, "warehouse.db", "fallback.csv").load_dataset().unwrap();
    assert_eq!(dataset.n_rows(), 7);
}

#[test]
fn test_both_sources_unavailable() {
    let dir = TempDir::new().unwrap();
    let err = source(&dir, "nope.db", "nope.csv").load_dataset().unwrap_err();
    assert!(matches!(err, AnalyticsError::DataUnavailable(_)));
}

#[test]
fn test_empty_fallback_is_unavailable() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("fallback.csv"), "anxiety_level,stress_level\n").unwrap();

    let err = source(&dir, "nope.db", "fallback.csv").load_dataset().unwrap_err();
    assert!(matches!(err, AnalyticsError::DataUnavailable(_)));
}

#[test]
fn test_fallback_infers_types_from_every_row() {
    let dir = TempDir::new().unwrap();
    let mut text = String::from("sleep_quality,stress_level\n");
    for i in 0..1100 {
        let sleep = if i == 1050 { "2.5".to_string() } else { (i % 5).to_string() };
        text.push_str(&format!("{},{}\n", sleep, i % 3));
    }
    std::fs::write(dir.path().join("fallback.csv"), text).unwrap();

    let dataset = source(&dir, "nope.db", "fallback.csv").load_dataset().unwrap();
    assert_eq!(dataset.n_rows(), 1100);
    assert!(!dataset.is_integral("sleep_quality").unwrap());
    assert_eq!(dataset.column_values("sleep_quality").unwrap()[1050], 2.5);
}

#[test]
fn test_csv_prefixed_columns_are_normalized() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("fallback.csv"),
        "survey.depression,survey.stress_level\n3,1\n9,2\n",
    )
    .unwrap();

    let dataset = source(&dir, "nope.db", "fallback.csv").load_dataset().unwrap();
    assert_eq!(dataset.column_names(), vec!["depression", "stress_level"]);
}

#[test]
fn test_invalid_table_name_rejected() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("warehouse.db");
    write_warehouse(&db, 3);

    let warehouse = SqliteWarehouse::new(&db);
    let err = warehouse.fetch_table("x; DROP TABLE y").unwrap_err();
    assert!(matches!(err, AnalyticsError::ValidationError(_)));
}

#[test]
fn test_close_then_reopen() {
    let dir = TempDir::new().unwrap();
    write_warehouse(&dir.path().join("warehouse.db"), 4);

    let source = source(&dir, "warehouse.db", "missing.csv");
    assert_eq!(source.load_dataset().unwrap().n_rows(), 4);
    source.close();
    assert_eq!(source.load_dataset().unwrap().n_rows(), 4);
}
