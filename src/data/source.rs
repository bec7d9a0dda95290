//! Warehouse-first dataset loading with a local CSV fallback

use crate::data::Dataset;
use crate::error::{AnalyticsError, Result};
use parking_lot::Mutex;
use polars::prelude::*;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where the dataset lives
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// SQLite warehouse database file
    pub warehouse_path: PathBuf,
    /// Table holding the survey
    pub table: String,
    /// Local CSV copy used when the warehouse is unreachable
    pub fallback_csv: PathBuf,
    /// Label column
    pub label_column: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            warehouse_path: std::env::var("WAREHOUSE_PATH")
                .unwrap_or_else(|_| "./warehouse.db".to_string())
                .into(),
            table: std::env::var("DATASET_TABLE")
                .unwrap_or_else(|_| "stress_level_dataset".to_string()),
            fallback_csv: std::env::var("FALLBACK_CSV")
                .unwrap_or_else(|_| "./ShapCompatibleDataset.csv".to_string())
                .into(),
            label_column: std::env::var("LABEL_COLUMN")
                .unwrap_or_else(|_| "stress_level".to_string()),
        }
    }
}

/// A queryable relational source that can return a whole table
pub trait Warehouse: Send + Sync {
    /// Run `SELECT *` over `table`
    fn fetch_table(&self, table: &str) -> Result<DataFrame>;

    /// Short description for logs
    fn describe(&self) -> String;

    /// Release any held connection
    fn close(&self) {}
}

/// Warehouse backed by an SQLite database file.
///
/// The connection is opened read-only on first use and kept until
/// [`Warehouse::close`] is called.
pub struct SqliteWarehouse {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl SqliteWarehouse {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: Mutex::new(None),
        }
    }
}

/// One cell as read from SQLite, before a column type is chosen
enum Cell {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

fn validate_identifier(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !table.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(AnalyticsError::ValidationError(format!(
            "invalid table name: {:?}",
            table
        )))
    }
}

fn cells_to_column(name: &str, cells: Vec<Cell>) -> Column {
    let has_text = cells.iter().any(|c| matches!(c, Cell::Text(_)));
    let has_real = cells.iter().any(|c| matches!(c, Cell::Real(_)));

    if has_text {
        let values: Vec<Option<String>> = cells
            .into_iter()
            .map(|c| match c {
                Cell::Null => None,
                Cell::Int(v) => Some(v.to_string()),
                Cell::Real(v) => Some(v.to_string()),
                Cell::Text(s) => Some(s),
            })
            .collect();
        Series::new(name.into(), values).into()
    } else if has_real {
        let values: Vec<Option<f64>> = cells
            .into_iter()
            .map(|c| match c {
                Cell::Int(v) => Some(v as f64),
                Cell::Real(v) => Some(v),
                _ => None,
            })
            .collect();
        Series::new(name.into(), values).into()
    } else {
        let values: Vec<Option<i64>> = cells
            .into_iter()
            .map(|c| match c {
                Cell::Int(v) => Some(v),
                _ => None,
            })
            .collect();
        Series::new(name.into(), values).into()
    }
}

impl Warehouse for SqliteWarehouse {
    fn fetch_table(&self, table: &str) -> Result<DataFrame> {
        validate_identifier(table)?;

        let mut guard = self.conn.lock();
        if guard.is_none() {
            let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
            debug!(path = %self.path.display(), "Opened warehouse connection");
            *guard = Some(conn);
        }
        let conn = guard.as_ref().ok_or_else(|| {
            AnalyticsError::WarehouseError("connection unavailable".to_string())
        })?;

        let sql = format!("SELECT * FROM \"{}\"", table);
        let mut stmt = conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut columns: Vec<Vec<Cell>> = names.iter().map(|_| Vec::new()).collect();

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (idx, cells) in columns.iter_mut().enumerate() {
                let cell = match row.get_ref(idx)? {
                    ValueRef::Null => Cell::Null,
                    ValueRef::Integer(v) => Cell::Int(v),
                    ValueRef::Real(v) => Cell::Real(v),
                    ValueRef::Text(bytes) => Cell::Text(String::from_utf8_lossy(bytes).into_owned()),
                    ValueRef::Blob(_) => {
                        return Err(AnalyticsError::WarehouseError(format!(
                            "column '{}' holds binary data",
                            names[idx]
                        )))
                    }
                };
                cells.push(cell);
            }
        }

        let columns: Vec<Column> = names
            .iter()
            .zip(columns)
            .map(|(name, cells)| cells_to_column(name, cells))
            .collect();

        Ok(DataFrame::new(columns)?)
    }

    fn describe(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }

    fn close(&self) {
        if let Some(conn) = self.conn.lock().take() {
            if let Err((_, e)) = conn.close() {
                warn!(error = %e, "Failed to close warehouse connection cleanly");
            } else {
                info!(path = %self.path.display(), "Warehouse connection closed");
            }
        }
    }
}

/// Load a CSV file with a header row
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .map_err(|e| AnalyticsError::DataError(format!("{}: {}", path.display(), e)))?;

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| AnalyticsError::DataError(e.to_string()))
}

/// Dataset provider: warehouse table first, local CSV second
pub struct DataSource {
    warehouse: Box<dyn Warehouse>,
    table: String,
    fallback_csv: PathBuf,
}

impl DataSource {
    pub fn new(warehouse: Box<dyn Warehouse>, table: impl Into<String>, fallback_csv: impl Into<PathBuf>) -> Self {
        Self {
            warehouse,
            table: table.into(),
            fallback_csv: fallback_csv.into(),
        }
    }

    /// SQLite warehouse plus CSV fallback as described by `config`
    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(
            Box::new(SqliteWarehouse::new(&config.warehouse_path)),
            config.table.clone(),
            config.fallback_csv.clone(),
        )
    }

    /// Load the dataset, falling back to the local CSV on any warehouse failure.
    ///
    /// Fails with [`AnalyticsError::DataUnavailable`] only when both sources
    /// are inaccessible or empty.
    pub fn load_dataset(&self) -> Result<Dataset> {
        let warehouse_error = match self.load_from_warehouse() {
            Ok(dataset) => {
                debug!(rows = dataset.n_rows(), source = %self.warehouse.describe(), "Loaded dataset from warehouse");
                return Ok(dataset);
            }
            Err(e) => e,
        };

        warn!(
            source = %self.warehouse.describe(),
            table = %self.table,
            error = %warehouse_error,
            fallback = %self.fallback_csv.display(),
            "Warehouse query failed, trying local fallback"
        );

        match self.load_from_fallback() {
            Ok(dataset) => {
                info!(rows = dataset.n_rows(), path = %self.fallback_csv.display(), "Loaded dataset from local fallback");
                Ok(dataset)
            }
            Err(fallback_error) => Err(AnalyticsError::DataUnavailable(format!(
                "warehouse: {}; fallback: {}",
                warehouse_error, fallback_error
            ))),
        }
    }

    fn load_from_warehouse(&self) -> Result<Dataset> {
        let frame = self.warehouse.fetch_table(&self.table)?;
        let dataset = Dataset::from_frame(frame)?;
        if dataset.is_empty() {
            return Err(AnalyticsError::WarehouseError(format!("table '{}' is empty", self.table)));
        }
        Ok(dataset)
    }

    fn load_from_fallback(&self) -> Result<Dataset> {
        if !self.fallback_csv.exists() {
            return Err(AnalyticsError::DataError(format!(
                "{} does not exist",
                self.fallback_csv.display()
            )));
        }
        let dataset = Dataset::from_frame(load_csv(&self.fallback_csv)?)?;
        if dataset.is_empty() {
            return Err(AnalyticsError::DataError(format!(
                "{} is empty",
                self.fallback_csv.display()
            )));
        }
        Ok(dataset)
    }

    /// Release the warehouse handle
    pub fn close(&self) {
        self.warehouse.close();
    }
}
