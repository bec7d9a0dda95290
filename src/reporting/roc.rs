//! ROC curves and area under the curve

use super::{sorted_labels, ReportInputs};
use crate::error::{AnalyticsError, Result};
use serde::Serialize;

/// One ROC curve, `label` being the class treated as positive
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocCurve {
    pub label: i64,
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub auc: f64,
}

/// Binary curve for two test labels, one-vs-rest curves otherwise
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocReport {
    pub binary: bool,
    pub curves: Vec<RocCurve>,
}

/// False and true positive rates over every distinct score threshold,
/// starting at `(0, 0)` and ending at `(1, 1)`.
///
/// A class with no positives (or no negatives) yields a zero rate on that axis.
pub fn roc_curve(positive: &[bool], scores: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
    if positive.len() != scores.len() {
        return Err(AnalyticsError::ShapeError {
            expected: format!("{} scores", positive.len()),
            actual: format!("{} scores", scores.len()),
        });
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let n_pos = positive.iter().filter(|&&p| p).count() as f64;
    let n_neg = positive.len() as f64 - n_pos;
    let rate = |count: f64, total: f64| if total > 0.0 { count / total } else { 0.0 };

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let (mut tp, mut fp) = (0.0, 0.0);
    for (k, &i) in order.iter().enumerate() {
        if positive[i] {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        // Emit a point only after the last sample sharing this score
        let last_of_score = order
            .get(k + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_score {
            fpr.push(rate(fp, n_neg));
            tpr.push(rate(tp, n_pos));
        }
    }

    Ok((fpr, tpr))
}

/// Trapezoidal area under a curve whose `x` is non-decreasing
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xw, yw)| (xw[1] - xw[0]) * (yw[0] + yw[1]) / 2.0)
        .sum()
}

fn curve_for(label: i64, test_labels: &[i64], scores: &[f64]) -> Result<RocCurve> {
    let positive: Vec<bool> = test_labels.iter().map(|&l| l == label).collect();
    let (fpr, tpr) = roc_curve(&positive, scores)?;
    let auc = auc(&fpr, &tpr);
    Ok(RocCurve { label, fpr, tpr, auc })
}

impl RocReport {
    /// Scores come from `predict_proba`, the column picked by label value.
    /// A label the model never saw scores zero everywhere.
    pub fn compute(inputs: &ReportInputs<'_>) -> Result<Self> {
        let labels = sorted_labels(&[inputs.test_labels]);
        if labels.len() < 2 {
            return Err(AnalyticsError::ComputationError(format!(
                "ROC needs at least two distinct test labels, found {}",
                labels.len()
            )));
        }

        let proba = inputs.model.predict_proba(inputs.test_features)?;
        let scores_for = |label: i64| -> Vec<f64> {
            match inputs.model.class_index(label) {
                Some(col) => proba.column(col).to_vec(),
                None => vec![0.0; proba.nrows()],
            }
        };

        if labels.len() == 2 {
            let positive = labels[1];
            let curve = curve_for(positive, inputs.test_labels, &scores_for(positive))?;
            return Ok(Self {
                binary: true,
                curves: vec![curve],
            });
        }

        let curves = labels
            .iter()
            .map(|&label| curve_for(label, inputs.test_labels, &scores_for(label)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            binary: false,
            curves,
        })
    }
}
