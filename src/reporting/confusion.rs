//! Confusion matrix

use super::sorted_labels;
use crate::error::{AnalyticsError, Result};
use serde::Serialize;

/// Confusion matrix over class labels.
///
/// `counts[i][j]` is the number of samples whose true label is `labels[i]`
/// and whose predicted label is `labels[j]`. The label axis is the sorted
/// union of true and predicted labels, so every row sum equals the number of
/// test samples carrying that true label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<i64>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[i64], y_pred: &[i64]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(AnalyticsError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(AnalyticsError::ValidationError(
                "confusion matrix needs at least one sample".to_string(),
            ));
        }

        let labels = sorted_labels(&[y_true, y_pred]);
        let n = labels.len();
        let mut counts = vec![vec![0usize; n]; n];
        for (t, p) in y_true.iter().zip(y_pred) {
            // Both are members of `labels` by construction
            let i = labels.binary_search(t).unwrap_or(0);
            let j = labels.binary_search(p).unwrap_or(0);
            counts[i][j] += 1;
        }

        Ok(Self { labels, counts })
    }

    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }

    /// Number of samples with true label `labels[i]`
    pub fn row_sum(&self, i: usize) -> usize {
        self.counts[i].iter().sum()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Largest single cell, used to scale heat-map colors
    pub fn max_count(&self) -> usize {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }

    /// Proportion of correct predictions
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.n_classes()).map(|i| self.counts[i][i]).sum();
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }

    /// (true positives, false positives, false negatives) of class `i`
    pub(crate) fn tp_fp_fn(&self, i: usize) -> (usize, usize, usize) {
        let n = self.n_classes();
        let tp = self.counts[i][i];
        let fp: usize = (0..n).filter(|&r| r != i).map(|r| self.counts[r][i]).sum();
        let fn_: usize = (0..n).filter(|&c| c != i).map(|c| self.counts[i][c]).sum();
        (tp, fp, fn_)
    }
}
