//! Split-and-train routine shared by every request handler

use super::random_forest::RandomForest;
use super::split::{train_test_split, SplitIndices};
use crate::data::Dataset;
use crate::error::{AnalyticsError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Seed shared by the split and the forest
pub const DEFAULT_SEED: u64 = 42;

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for both the split and the forest
    pub random_seed: u64,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum tree depth
    pub max_depth: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_seed: DEFAULT_SEED,
            n_estimators: 300,
            max_depth: 5,
        }
    }
}

impl TrainingConfig {
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }
}

/// Everything a handler needs after training
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    /// Fitted forest
    pub model: RandomForest,
    /// Feature columns in dataset order
    pub features: Vec<String>,
    /// Held-out accuracy in `[0, 1]`
    pub accuracy: f64,
    /// Test partition features, label excluded
    pub test_features: Array2<f64>,
    /// Dataset row indices of the test partition
    pub test_rows: Vec<usize>,
}

/// Trains a fresh forest from a dataset. Holds no state between calls.
#[derive(Debug, Clone, Default)]
pub struct TrainEngine {
    config: TrainingConfig,
}

impl TrainEngine {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    fn features(dataset: &Dataset, label_column: &str) -> Result<Vec<String>> {
        if !dataset.has_column(label_column) {
            return Err(AnalyticsError::FeatureNotFound(label_column.to_string()));
        }
        let features = dataset.feature_columns(label_column);
        if features.is_empty() {
            return Err(AnalyticsError::NoFeatures(label_column.to_string()));
        }
        Ok(features)
    }

    fn split(&self, dataset: &Dataset) -> Result<SplitIndices> {
        train_test_split(dataset.n_rows(), self.config.test_size, self.config.random_seed)
    }

    /// Split, fit and evaluate
    pub fn train(&self, dataset: &Dataset, label_column: &str) -> Result<TrainOutcome> {
        let start = Instant::now();
        let features = Self::features(dataset, label_column)?;
        let x = dataset.feature_matrix(&features)?;
        let y = dataset.labels(label_column)?;
        let split = self.split(dataset)?;

        let x_train = split.train_rows(&x);
        let y_train = split.train_labels(&y);
        let x_test = split.test_rows(&x);
        let y_test = split.test_labels(&y);

        debug!(
            train_rows = x_train.nrows(),
            test_rows = x_test.nrows(),
            features = features.len(),
            "Fitting random forest"
        );

        let mut model = RandomForest::new(self.config.n_estimators)
            .with_max_depth(self.config.max_depth)
            .with_random_state(self.config.random_seed);
        model.fit(&x_train, &y_train)?;

        let predictions = model.predict(&x_test)?;
        let accuracy = accuracy_score(&y_test, &predictions);

        info!(
            accuracy,
            n_estimators = self.config.n_estimators,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Model trained"
        );

        Ok(TrainOutcome {
            model,
            features,
            accuracy,
            test_features: x_test,
            test_rows: split.test,
        })
    }

    /// Re-derive the test labels by repeating the split on a freshly loaded dataset
    pub fn test_labels(&self, dataset: &Dataset, label_column: &str) -> Result<Vec<i64>> {
        let y = dataset.labels(label_column)?;
        let split = self.split(dataset)?;
        Ok(split.test_labels(&y))
    }
}

/// Train with the default configuration (80/20 split, 300 trees of depth 5, seed 42)
pub fn train(dataset: &Dataset, label_column: &str) -> Result<TrainOutcome> {
    TrainEngine::default().train(dataset, label_column)
}

/// Fraction of positions where `y_true` and `y_pred` agree
pub fn accuracy_score(y_true: &[i64], y_pred: &[i64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn create_test_data() -> Dataset {
        let n = 30;
        let a: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..n).map(|i| ((i * 7) % 5) as f64).collect();
        let label: Vec<i64> = (0..n).map(|i| if i < 15 { 0 } else { 1 }).collect();
        let frame = df!("a" => a, "b" => b, "stress_level" => label).unwrap();
        Dataset::from_frame(frame).unwrap()
    }

    #[test]
    fn test_train_outcome_shape() {
        let dataset = create_test_data();
        let engine = TrainEngine::new(TrainingConfig::default().with_n_estimators(20));
        let outcome = engine.train(&dataset, "stress_level").unwrap();

        assert_eq!(outcome.features, vec!["a", "b"]);
        assert_eq!(outcome.test_features.dim(), (6, 2));
        assert_eq!(outcome.test_rows.len(), 6);
        assert!((0.0..=1.0).contains(&outcome.accuracy));
        assert_eq!(outcome.model.n_trees(), 20);
    }

    #[test]
    fn test_labels_match_test_rows() {
        let dataset = create_test_data();
        let engine = TrainEngine::new(TrainingConfig::default().with_n_estimators(5));
        let outcome = engine.train(&dataset, "stress_level").unwrap();
        let labels = engine.test_labels(&dataset, "stress_level").unwrap();

        let expected: Vec<i64> = outcome
            .test_rows
            .iter()
            .map(|&r| if r < 15 { 0 } else { 1 })
            .collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn test_no_features() {
        let frame = df!("stress_level" => &[0i64, 1, 0, 1, 0]).unwrap();
        let dataset = Dataset::from_frame(frame).unwrap();
        let err = train(&dataset, "stress_level").unwrap_err();
        assert!(matches!(err, AnalyticsError::NoFeatures(_)));
    }

    #[test]
    fn test_missing_label_column() {
        let dataset = create_test_data();
        let err = train(&dataset, "mood").unwrap_err();
        assert!(matches!(err, AnalyticsError::FeatureNotFound(_)));
    }

    #[test]
    fn test_accuracy_score() {
        assert_eq!(accuracy_score(&[0, 1, 2, 2], &[0, 1, 1, 2]), 0.75);
        assert_eq!(accuracy_score(&[], &[]), 0.0);
    }
}
