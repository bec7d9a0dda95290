//! Application state management

use tracing::{info, warn};

use crate::data::{DataSource, Dataset};
use crate::error::Result;
use crate::reporting::ReportInputs;
use crate::training::{TrainEngine, TrainOutcome, TrainingConfig};

use super::ServerConfig;

/// State shared across handlers.
///
/// Only the data source is long-lived. Models, splits and reports are
/// rebuilt on every request.
pub struct AppState {
    pub config: ServerConfig,
    pub source: DataSource,
    pub engine: TrainEngine,
    label_column: String,
}

/// A freshly trained model with the test labels aligned to its test rows
pub struct TrainedModel {
    pub outcome: TrainOutcome,
    pub test_labels: Vec<i64>,
}

impl TrainedModel {
    pub fn report_inputs(&self) -> Result<ReportInputs<'_>> {
        ReportInputs::new(
            &self.outcome.model,
            &self.outcome.test_features,
            &self.test_labels,
            &self.outcome.features,
        )
    }
}

impl AppState {
    pub fn new(config: ServerConfig, source: DataSource, label_column: impl Into<String>) -> Self {
        Self {
            config,
            source,
            engine: TrainEngine::new(TrainingConfig::default()),
            label_column: label_column.into(),
        }
    }

    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    pub fn load_dataset(&self) -> Result<Dataset> {
        self.source.load_dataset()
    }

    /// Load the dataset and train on it
    pub fn train(&self) -> Result<TrainOutcome> {
        let dataset = self.load_dataset()?;
        self.engine.train(&dataset, self.label_column())
    }

    /// Train, then reload the dataset to recover the true test labels.
    ///
    /// A failed reload is an error. If the labels cannot be derived or do not
    /// line up with the test rows, the model's own predictions stand in.
    pub fn train_for_reports(&self) -> Result<TrainedModel> {
        let outcome = self.train()?;

        let dataset = self.load_dataset()?;
        let n_test = outcome.test_features.nrows();
        let test_labels = match self.engine.test_labels(&dataset, self.label_column()) {
            Ok(labels) if labels.len() == n_test => labels,
            Ok(labels) => {
                warn!(
                    test_rows = n_test,
                    labels = labels.len(),
                    "Test labels do not match test rows, using predictions instead"
                );
                outcome.model.predict(&outcome.test_features)?
            }
            Err(e) => {
                warn!(error = %e, "Could not derive test labels, using predictions instead");
                outcome.model.predict(&outcome.test_features)?
            }
        };
        info!(test_rows = n_test, "Prepared test labels for reports");

        Ok(TrainedModel { outcome, test_labels })
    }

    /// Release the warehouse connection
    pub fn shutdown(&self) {
        self.source.close();
    }
}
