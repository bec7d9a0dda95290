//! Integration test: split and training routine

use polars::prelude::*;
use stress_analytics::data::Dataset;
use stress_analytics::error::AnalyticsError;
use stress_analytics::training::{train, train_test_split, TrainEngine, TrainingConfig};

/// 100 rows, 5 features, labels 0..=2 with a learnable signal
fn stress_dataset(n: usize) -> Dataset {
    let label: Vec<i64> = (0..n).map(|i| (i % 3) as i64).collect();
    let anxiety: Vec<i64> = label.iter().enumerate().map(|(i, &l)| l * 7 + (i * 13 % 7) as i64).collect();
    let esteem: Vec<i64> = label.iter().enumerate().map(|(i, &l)| 30 - l * 8 - (i * 7 % 5) as i64).collect();
    let depression: Vec<i64> = label.iter().enumerate().map(|(i, &l)| l * 9 + (i % 4) as i64).collect();
    let sleep: Vec<f64> = label
        .iter()
        .enumerate()
        .map(|(i, &l)| 5.0 - l as f64 * 1.5 + ((i * 31) % 10) as f64 * 0.05)
        .collect();
    let noise: Vec<i64> = (0..n).map(|i| (i * 17 % 6) as i64).collect();

    let frame = df!(
        "anxiety_level" => anxiety,
        "self_esteem" => esteem,
        "depression" => depression,
        "sleep_quality" => sleep,
        "noise_level" => noise,
        "stress_level" => label
    )
    .unwrap();
    Dataset::from_frame(frame).unwrap()
}

#[test]
fn test_split_is_deterministic() {
    let a = train_test_split(100, 0.2, 42).unwrap();
    let b = train_test_split(100, 0.2, 42).unwrap();
    assert_eq!(a.test, b.test);
    assert_eq!(a.train, b.train);
    assert_eq!(a.test.len(), 20);
    assert_eq!(a.train.len(), 80);
}

#[test]
fn test_end_to_end_training() {
    let dataset = stress_dataset(100);
    let outcome = train(&dataset, "stress_level").unwrap();

    assert_eq!(
        outcome.features,
        vec!["anxiety_level", "self_esteem", "depression", "sleep_quality", "noise_level"]
    );
    assert!((0.0..=1.0).contains(&outcome.accuracy));
    assert_eq!(outcome.test_features.nrows(), 20);
    assert_eq!(outcome.test_features.ncols(), 5);
    assert_eq!(outcome.model.n_trees(), 300);

    let importances = outcome.model.feature_importances().unwrap();
    assert!((importances.sum() - 1.0).abs() < 1e-9);
    assert!(importances.iter().all(|&v| v >= 0.0));
}

#[test]
fn test_learnable_signal_is_learned() {
    let outcome = train(&stress_dataset(100), "stress_level").unwrap();
    assert!(outcome.accuracy > 0.8, "accuracy = {}", outcome.accuracy);
}

#[test]
fn test_training_is_reproducible() {
    let dataset = stress_dataset(100);
    let a = train(&dataset, "stress_level").unwrap();
    let b = train(&dataset, "stress_level").unwrap();

    assert_eq!(a.accuracy, b.accuracy);
    assert_eq!(a.test_rows, b.test_rows);
    assert_eq!(a.model.feature_importances(), b.model.feature_importances());
    assert_eq!(
        a.model.predict(&a.test_features).unwrap(),
        b.model.predict(&b.test_features).unwrap()
    );
}

#[test]
fn test_test_labels_match_test_rows() {
    let dataset = stress_dataset(100);
    let engine = TrainEngine::new(TrainingConfig::default().with_n_estimators(20));
    let outcome = engine.train(&dataset, "stress_level").unwrap();
    let labels = engine.test_labels(&dataset, "stress_level").unwrap();

    let all = dataset.labels("stress_level").unwrap();
    let expected: Vec<i64> = outcome.test_rows.iter().map(|&r| all[r]).collect();
    assert_eq!(labels, expected);
}

#[test]
fn test_missing_label_column() {
    let err = train(&stress_dataset(30), "burnout").unwrap_err();
    assert!(matches!(err, AnalyticsError::FeatureNotFound(_)));
}

#[test]
fn test_label_only_dataset() {
    let frame = df!("stress_level" => &[0i64, 1, 2, 1, 0]).unwrap();
    let dataset = Dataset::from_frame(frame).unwrap();
    let err = train(&dataset, "stress_level").unwrap_err();
    assert!(matches!(err, AnalyticsError::NoFeatures(_)));
}
