//! Synthetic dataset generation
//!
//! Produces a dataset with the same columns as a source dataset:
//! - features drawn from a multivariate normal fitted to the standardized
//!   source features, mapped back to the source scale
//! - integer columns rounded, every column clipped to its source range
//! - labels assigned by a random forest trained on the source data

mod multivariate;

pub use multivariate::{
    cholesky, cholesky_with_jitter, covariance, standard_normals, ColumnScaler, MultivariateNormal,
};

use crate::data::Dataset;
use crate::error::{AnalyticsError, Result};
use crate::reporting::{feature_importance, FeatureImportance};
use crate::training::RandomForest;
use ndarray::{Array2, Axis};
use polars::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tracing::info;

/// Generated frame plus what the CLI reports about it
#[derive(Debug, Clone)]
pub struct Synthesis {
    /// Features in source order, label column last
    pub frame: DataFrame,
    /// Importances of the labelling forest, highest first
    pub importances: Vec<FeatureImportance>,
    pub source_labels: BTreeMap<i64, usize>,
    pub synthetic_labels: BTreeMap<i64, usize>,
}

/// Share of each label in a histogram, in label order
pub fn label_proportions(histogram: &BTreeMap<i64, usize>) -> Vec<(i64, f64)> {
    let total: usize = histogram.values().sum();
    histogram
        .iter()
        .map(|(&label, &count)| {
            let share = if total == 0 { 0.0 } else { count as f64 / total as f64 };
            (label, share)
        })
        .collect()
}

/// Seeded generator of synthetic rows
#[derive(Debug, Clone)]
pub struct Synthesizer {
    n_samples: usize,
    n_estimators: usize,
    max_depth: usize,
    seed: u64,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self {
            n_samples: 1000,
            n_estimators: 100,
            max_depth: 5,
            seed: 42,
        }
    }
}

impl Synthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_samples(mut self, n_samples: usize) -> Self {
        self.n_samples = n_samples;
        self
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn generate(&self, dataset: &Dataset, label_column: &str) -> Result<Synthesis> {
        if !dataset.has_column(label_column) {
            return Err(AnalyticsError::FeatureNotFound(label_column.to_string()));
        }
        let features = dataset.feature_columns(label_column);
        if features.is_empty() {
            return Err(AnalyticsError::NoFeatures(label_column.to_string()));
        }
        if dataset.n_rows() < 2 {
            return Err(AnalyticsError::ValidationError(format!(
                "need at least 2 source rows, got {}",
                dataset.n_rows()
            )));
        }
        if self.n_samples == 0 {
            return Err(AnalyticsError::ValidationError("n_samples must be positive".into()));
        }

        let x = dataset.feature_matrix(&features)?;
        let y = dataset.labels(label_column)?;
        let integral: Vec<bool> = features
            .iter()
            .map(|f| dataset.is_integral(f))
            .collect::<Result<_>>()?;

        let scaler = ColumnScaler::fit(&x)?;
        let x_scaled = scaler.transform(&x);

        let mut model = RandomForest::new(self.n_estimators)
            .with_max_depth(self.max_depth)
            .with_random_state(self.seed);
        model.fit(&x_scaled, &y)?;
        let importances = feature_importance(&model, &features)?;

        let mvn = MultivariateNormal::new(&covariance(&x_scaled)?)?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut generated = scaler.inverse_transform(&mvn.sample(&mut rng, self.n_samples)?);
        clamp_to_source(&mut generated, &x, &integral);

        let labels = model.predict(&scaler.transform(&generated))?;
        let frame = build_frame(&features, &integral, &generated, label_column, &labels)?;

        let mut synthetic_labels = BTreeMap::new();
        for &label in &labels {
            *synthetic_labels.entry(label).or_insert(0) += 1;
        }
        info!(
            rows = self.n_samples,
            features = features.len(),
            classes = synthetic_labels.len(),
            "Generated synthetic dataset"
        );

        Ok(Synthesis {
            frame,
            importances,
            source_labels: dataset.label_histogram(label_column)?,
            synthetic_labels,
        })
    }
}

/// Round integral columns, then clip every column to the source range
fn clamp_to_source(generated: &mut Array2<f64>, source: &Array2<f64>, integral: &[bool]) {
    for (j, mut column) in generated.axis_iter_mut(Axis(1)).enumerate() {
        let src = source.column(j);
        let lo = src.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = src.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let round = integral[j];
        column.mapv_inplace(|v| {
            let v = if round { v.round() } else { v };
            v.clamp(lo, hi)
        });
    }
}

fn build_frame(
    features: &[String],
    integral: &[bool],
    values: &Array2<f64>,
    label_column: &str,
    labels: &[i64],
) -> Result<DataFrame> {
    let mut columns: Vec<Column> = features
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let col = values.column(j);
            let series = if integral[j] {
                let ints: Vec<i64> = col.iter().map(|&v| v as i64).collect();
                Series::new(name.as_str().into(), ints)
            } else {
                Series::new(name.as_str().into(), col.to_vec())
            };
            series.into()
        })
        .collect();
    columns.push(Series::new(label_column.into(), labels.to_vec()).into());

    Ok(DataFrame::new(columns)?)
}
