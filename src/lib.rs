//! Stress Analytics - stress-level classifier backend
//!
//! This crate loads a student stress survey, trains a random forest on a
//! deterministic split, and serves diagnostics as JSON and PNG charts.
//!
//! # Modules
//!
//! ## Core
//! - [`data`] - Warehouse-first dataset loading with a CSV fallback
//! - [`training`] - Seeded train/test split and random forest
//! - [`reporting`] - Importance, confusion matrix, classification report, densities, ROC
//! - [`render`] - Chart rendering to base64 PNG
//! - [`synthetic`] - Synthetic dataset generation
//!
//! ## Services
//! - [`server`] - HTTP server with REST API
//! - [`cli`] - Command-line interface

pub mod error;

pub mod data;
pub mod training;
pub mod reporting;
pub mod render;
pub mod synthetic;

pub mod server;
pub mod cli;

pub use error::{AnalyticsError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::data::{DataSource, Dataset, SourceConfig, SqliteWarehouse, Warehouse};
    pub use crate::error::{AnalyticsError, Result};
    pub use crate::render::{auc_roc_plot, model_plots, ModelPlots};
    pub use crate::reporting::{feature_importance, ClassificationReport, ConfusionMatrix, ReportInputs, RocReport};
    pub use crate::synthetic::Synthesizer;
    pub use crate::training::{train, RandomForest, TrainEngine, TrainOutcome, TrainingConfig};
}
