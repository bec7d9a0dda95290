//! Integration test: diagnostics and chart rendering on a trained forest

use polars::prelude::*;
use stress_analytics::data::Dataset;
use stress_analytics::render::{
    auc_roc_plot, classification_chart, confusion_chart, distribution_chart, importance_chart, model_plots,
};
use stress_analytics::reporting::{
    feature_distributions, feature_importance, ClassificationReport, ConfusionMatrix,
    ReportInputs, RocReport,
};
use stress_analytics::training::{TrainEngine, TrainOutcome, TrainingConfig};

fn stress_dataset(n: usize, classes: i64) -> Dataset {
    let label: Vec<i64> = (0..n as i64).map(|i| i % classes).collect();
    let anxiety: Vec<i64> = label.iter().enumerate().map(|(i, &l)| l * 8 + (i % 5) as i64).collect();
    let esteem: Vec<i64> = label.iter().enumerate().map(|(i, &l)| 30 - l * 9 - (i % 4) as i64).collect();
    let sleep: Vec<f64> = label
        .iter()
        .enumerate()
        .map(|(i, &l)| 5.0 - l as f64 * 2.0 + (i % 7) as f64 * 0.1)
        .collect();
    let noise: Vec<i64> = (0..n).map(|i| (i * 11 % 6) as i64).collect();

    let frame = df!(
        "anxiety_level" => anxiety,
        "self_esteem" => esteem,
        "sleep_quality" => sleep,
        "noise_level" => noise,
        "stress_level" => label
    )
    .unwrap();
    Dataset::from_frame(frame).unwrap()
}

fn trained(dataset: &Dataset) -> (TrainOutcome, Vec<i64>) {
    let engine = TrainEngine::new(TrainingConfig::default().with_n_estimators(40));
    let outcome = engine.train(dataset, "stress_level").unwrap();
    let labels = engine.test_labels(dataset, "stress_level").unwrap();
    (outcome, labels)
}

#[test]
fn test_importances_rank_and_sum() {
    let dataset = stress_dataset(90, 3);
    let (outcome, _) = trained(&dataset);
    let ranked = feature_importance(&outcome.model, &outcome.features).unwrap();

    assert_eq!(ranked.len(), 4);
    let total: f64 = ranked.iter().map(|fi| fi.importance).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(ranked.windows(2).all(|w| w[0].importance >= w[1].importance));
}

#[test]
fn test_confusion_rows_match_true_counts() {
    let dataset = stress_dataset(90, 3);
    let (outcome, labels) = trained(&dataset);
    let inputs = ReportInputs::new(&outcome.model, &outcome.test_features, &labels, &outcome.features).unwrap();
    let predicted = inputs.predictions().unwrap();

    let cm = ConfusionMatrix::from_labels(&labels, &predicted).unwrap();
    assert_eq!(cm.total(), labels.len());
    for (i, &label) in cm.labels.iter().enumerate() {
        let expected = labels.iter().filter(|&&l| l == label).count();
        assert_eq!(cm.row_sum(i), expected);
    }

    let report = ClassificationReport::from_confusion(&cm);
    assert!((report.accuracy - outcome.accuracy).abs() < 1e-12);
    assert_eq!(report.macro_avg.support, labels.len());
}

#[test]
fn test_binary_forest_auc() {
    let dataset = stress_dataset(120, 2);
    let (outcome, labels) = trained(&dataset);
    let inputs = ReportInputs::new(&outcome.model, &outcome.test_features, &labels, &outcome.features).unwrap();

    let report = RocReport::compute(&inputs).unwrap();
    assert!(report.binary);
    assert_eq!(report.curves.len(), 1);
    assert_eq!(report.curves[0].label, 1);
    assert!(report.curves[0].auc > 0.95, "auc = {}", report.curves[0].auc);
}

#[test]
fn test_multiclass_one_vs_rest() {
    let dataset = stress_dataset(90, 3);
    let (outcome, labels) = trained(&dataset);
    let inputs = ReportInputs::new(&outcome.model, &outcome.test_features, &labels, &outcome.features).unwrap();

    let report = RocReport::compute(&inputs).unwrap();
    assert!(!report.binary);
    let curve_labels: Vec<i64> = report.curves.iter().map(|c| c.label).collect();
    assert_eq!(curve_labels, vec![0, 1, 2]);
    for curve in &report.curves {
        assert!((0.0..=1.0).contains(&curve.auc));
        assert_eq!(curve.fpr.first(), Some(&0.0));
        assert_eq!(curve.tpr.last(), Some(&1.0));
    }
}

#[test]
fn test_model_plots_render_without_placeholders() {
    let dataset = stress_dataset(90, 3);
    let (outcome, labels) = trained(&dataset);
    let inputs = ReportInputs::new(&outcome.model, &outcome.test_features, &labels, &outcome.features).unwrap();

    let plots = model_plots(&inputs);

    let ranked = feature_importance(&outcome.model, &outcome.features).unwrap();
    let predicted = inputs.predictions().unwrap();
    let cm = ConfusionMatrix::from_labels(&labels, &predicted).unwrap();
    let densities = feature_distributions(&inputs).unwrap();

    assert_eq!(plots.feature_importance, importance_chart(&ranked).unwrap());
    assert_eq!(plots.confusion_matrix, confusion_chart(&cm).unwrap());
    assert_eq!(plots.feature_distribution, distribution_chart(&densities).unwrap());
    assert_eq!(
        plots.classification_report,
        classification_chart(&ClassificationReport::from_confusion(&cm)).unwrap()
    );
    assert_eq!(plots.auc_roc_curve, auc_roc_plot(&inputs).unwrap());
}

#[test]
fn test_distributions_cover_top_features() {
    let dataset = stress_dataset(90, 3);
    let (outcome, labels) = trained(&dataset);
    let inputs = ReportInputs::new(&outcome.model, &outcome.test_features, &labels, &outcome.features).unwrap();

    let densities = feature_distributions(&inputs).unwrap();
    let ranked = feature_importance(&outcome.model, &outcome.features).unwrap();

    assert_eq!(densities.len(), 4);
    for (density, fi) in densities.iter().zip(&ranked) {
        assert_eq!(density.feature, fi.feature);
        assert!(density.curves.windows(2).all(|w| w[0].label < w[1].label));
    }
}
