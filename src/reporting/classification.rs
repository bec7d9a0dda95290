//! Per-class precision, recall and F1

use super::confusion::ConfusionMatrix;
use crate::error::Result;
use serde::Serialize;

/// Metrics for one class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: i64,
    /// TP / (TP + FP); 0.0 when the class is never predicted
    pub precision: f64,
    /// TP / (TP + FN); 0.0 when the class never occurs
    pub recall: f64,
    /// Harmonic mean of precision and recall; 0.0 when both are zero
    pub f1: f64,
    /// True samples of this class
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Multi-class classification report.
///
/// `classes` holds only the per-class rows; the three aggregate rows
/// (accuracy, macro average, weighted average) live in their own fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassificationReport {
    pub fn from_labels(y_true: &[i64], y_pred: &[i64]) -> Result<Self> {
        let cm = ConfusionMatrix::from_labels(y_true, y_pred)?;
        Ok(Self::from_confusion(&cm))
    }

    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let classes: Vec<ClassMetrics> = cm
            .labels
            .iter()
            .enumerate()
            .map(|(i, &label)| {
                let (tp, fp, fn_) = cm.tp_fp_fn(i);
                let precision = ratio(tp, tp + fp);
                let recall = ratio(tp, tp + fn_);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label,
                    precision,
                    recall,
                    f1,
                    support: cm.row_sum(i),
                }
            })
            .collect();

        let total_support: usize = classes.iter().map(|c| c.support).sum();
        let n = classes.len().max(1) as f64;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n,
            support: total_support,
        };

        let weight = |f: fn(&ClassMetrics) -> f64| -> f64 {
            if total_support == 0 {
                0.0
            } else {
                classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total_support as f64
            }
        };
        let weighted_avg = AverageMetrics {
            precision: weight(|c| c.precision),
            recall: weight(|c| c.recall),
            f1: weight(|c| c.f1),
            support: total_support,
        };

        Self {
            accuracy: cm.accuracy(),
            classes,
            macro_avg,
            weighted_avg,
        }
    }
}
