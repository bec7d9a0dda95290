//! Dataset access
//!
//! Provides everything needed to get the stress survey into memory:
//! - [`Dataset`]: an ordered table with a designated label column
//! - [`DataSource`]: warehouse-first loading with a local CSV fallback
//! - [`Warehouse`] / [`SqliteWarehouse`]: the queryable table seam
//! - [`display_name`]: human-readable feature labels for presentation

mod dataset;
mod display;
mod source;

pub use dataset::{normalize_column_name, DataSummary, Dataset};
pub use display::{display_name, display_names};
pub use source::{load_csv, DataSource, SourceConfig, SqliteWarehouse, Warehouse};
