//! Per-label kernel density curves for the most important features

use super::importance::feature_importance;
use super::{sorted_labels, ReportInputs};
use crate::error::Result;
use serde::Serialize;
use std::f64::consts::PI;

/// Number of features shown in the distribution panel
pub const TOP_FEATURES: usize = 4;

const GRID_POINTS: usize = 200;
const CUT: f64 = 3.0;

/// Density of one feature restricted to one test label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityCurve {
    pub label: i64,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureDensity {
    pub feature: String,
    /// One curve per test label with enough spread to estimate a density
    pub curves: Vec<DensityCurve>,
}

fn sample_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (n - 1.0)).sqrt()
}

/// Gaussian KDE with Scott's bandwidth evaluated on an evenly spaced grid
/// spanning `[min - 3h, max + 3h]`.
///
/// Returns `None` for fewer than two points or a constant sample.
pub fn gaussian_kde(values: &[f64]) -> Option<(Vec<f64>, Vec<f64>)> {
    if values.len() < 2 {
        return None;
    }
    let std = sample_std(values);
    if !std.is_finite() || std <= 0.0 {
        return None;
    }

    let n = values.len() as f64;
    let h = std * n.powf(-0.2);
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min) - CUT * h;
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max) + CUT * h;
    let step = (hi - lo) / (GRID_POINTS - 1) as f64;
    let norm = 1.0 / (n * h * (2.0 * PI).sqrt());

    let xs: Vec<f64> = (0..GRID_POINTS).map(|i| lo + step * i as f64).collect();
    let ys: Vec<f64> = xs
        .iter()
        .map(|&x| {
            values
                .iter()
                .map(|&v| {
                    let z = (x - v) / h;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm
        })
        .collect();

    Some((xs, ys))
}

/// Densities of the top [`TOP_FEATURES`] features, one curve per distinct
/// test label.
pub fn feature_distributions(inputs: &ReportInputs<'_>) -> Result<Vec<FeatureDensity>> {
    let ranked = feature_importance(inputs.model, inputs.features)?;
    let labels = sorted_labels(&[inputs.test_labels]);

    let densities = ranked
        .iter()
        .take(TOP_FEATURES)
        .map(|fi| {
            // feature_importance validated the names against the matrix width
            let col = inputs
                .features
                .iter()
                .position(|f| f == &fi.feature)
                .unwrap_or(0);
            let column = inputs.test_features.column(col);

            let curves = labels
                .iter()
                .filter_map(|&label| {
                    let values: Vec<f64> = column
                        .iter()
                        .zip(inputs.test_labels)
                        .filter(|(_, l)| **l == label)
                        .map(|(&v, _)| v)
                        .collect();
                    gaussian_kde(&values).map(|(xs, ys)| DensityCurve { label, xs, ys })
                })
                .collect();

            FeatureDensity {
                feature: fi.feature.clone(),
                curves,
            }
        })
        .collect();

    Ok(densities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kde_integrates_to_one() {
        let values = [1.0, 2.0, 2.5, 3.0, 4.5, 5.0];
        let (xs, ys) = gaussian_kde(&values).unwrap();
        assert_eq!(xs.len(), GRID_POINTS);

        let step = xs[1] - xs[0];
        let area: f64 = ys.iter().sum::<f64>() * step;
        assert!((area - 1.0).abs() < 0.01, "area = {area}");
    }

    #[test]
    fn test_kde_grid_bounds() {
        let values = [0.0, 1.0, 2.0];
        let (xs, _) = gaussian_kde(&values).unwrap();
        let h = 1.0 * 3f64.powf(-0.2);
        assert!((xs[0] - (0.0 - 3.0 * h)).abs() < 1e-12);
        assert!((xs[GRID_POINTS - 1] - (2.0 + 3.0 * h)).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_groups_skipped() {
        assert!(gaussian_kde(&[1.0]).is_none());
        assert!(gaussian_kde(&[2.0, 2.0, 2.0]).is_none());
        assert!(gaussian_kde(&[]).is_none());
    }
}
