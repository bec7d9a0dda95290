//! Diagnostic reports over a fitted forest and its test partition
//!
//! Every report is a read-only view; nothing here mutates the model or the data.
//! - [`feature_importance`]: ranked `(feature, importance)` pairs
//! - [`ConfusionMatrix`]: true vs predicted label counts
//! - [`ClassificationReport`]: per-class precision, recall and F1
//! - [`feature_distributions`]: per-label kernel density curves of the top features
//! - [`RocReport`]: binary or one-vs-rest ROC curves with AUC

mod classification;
mod confusion;
mod distribution;
mod importance;
mod roc;

pub use classification::{AverageMetrics, ClassMetrics, ClassificationReport};
pub use confusion::ConfusionMatrix;
pub use distribution::{feature_distributions, gaussian_kde, DensityCurve, FeatureDensity, TOP_FEATURES};
pub use importance::{feature_importance, FeatureImportance};
pub use roc::{auc, roc_curve, RocCurve, RocReport};

use crate::error::{AnalyticsError, Result};
use crate::training::RandomForest;
use ndarray::Array2;

/// Model plus held-out data shared by every report
pub struct ReportInputs<'a> {
    pub model: &'a RandomForest,
    pub test_features: &'a Array2<f64>,
    pub test_labels: &'a [i64],
    pub features: &'a [String],
}

impl<'a> ReportInputs<'a> {
    pub fn new(
        model: &'a RandomForest,
        test_features: &'a Array2<f64>,
        test_labels: &'a [i64],
        features: &'a [String],
    ) -> Result<Self> {
        if test_features.nrows() != test_labels.len() {
            return Err(AnalyticsError::ShapeError {
                expected: format!("{} test labels", test_features.nrows()),
                actual: format!("{} test labels", test_labels.len()),
            });
        }
        if test_features.ncols() != features.len() {
            return Err(AnalyticsError::ShapeError {
                expected: format!("{} feature names", test_features.ncols()),
                actual: format!("{} feature names", features.len()),
            });
        }
        Ok(Self {
            model,
            test_features,
            test_labels,
            features,
        })
    }

    /// Hard predictions on the test features
    pub fn predictions(&self) -> Result<Vec<i64>> {
        self.model.predict(self.test_features)
    }
}

/// Sorted distinct values of the given label slices
pub(crate) fn sorted_labels(slices: &[&[i64]]) -> Vec<i64> {
    let mut labels: Vec<i64> = slices.iter().flat_map(|s| s.iter().copied()).collect();
    labels.sort_unstable();
    labels.dedup();
    labels
}
