//! In-memory dataset with a designated label column

use crate::error::{AnalyticsError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use super::display::display_names;

/// Overview of a dataset as reported to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub total_rows: usize,
    /// Columns other than the label
    pub feature_count: usize,
    /// Display names of the feature columns
    pub features: Vec<String>,
    pub label_distribution: BTreeMap<i64, usize>,
}

/// Strip a qualifying prefix such as `table.column` down to `column`.
pub fn normalize_column_name(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).to_string()
}

/// Ordered tabular dataset.
///
/// Column names are normalized on construction. Feature values are read as
/// `f64`: numeric columns are cast, string columns become codes over their
/// sorted distinct values, and missing cells are imputed as `0.0`.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    /// Wrap a frame, normalizing qualified column names.
    ///
    /// Two columns that normalize to the same bare name are rejected.
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in frame.get_columns() {
            let bare = normalize_column_name(column.name().as_str());
            if !seen.insert(bare.clone()) {
                return Err(AnalyticsError::ValidationError(format!(
                    "column '{}' appears more than once after removing table prefixes",
                    bare
                )));
            }
        }

        let columns: Vec<Column> = frame
            .get_columns()
            .iter()
            .map(|column| {
                let mut column = column.clone();
                let bare = normalize_column_name(column.name().as_str());
                column.rename(bare.into());
                column
            })
            .collect();

        let frame = DataFrame::new(columns)?;
        Ok(Self { frame })
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.frame.height()
    }

    /// Number of columns, label included
    pub fn n_columns(&self) -> usize {
        self.frame.width()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0 || self.frame.width() == 0
    }

    /// Column names in original order
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// All columns except `label_column`, in original order
    pub fn feature_columns(&self, label_column: &str) -> Vec<String> {
        self.column_names()
            .into_iter()
            .filter(|name| name != label_column)
            .collect()
    }

    /// Whether a column holds integral values (integers, booleans, encoded categories)
    pub fn is_integral(&self, name: &str) -> Result<bool> {
        let column = self
            .frame
            .column(name)
            .map_err(|_| AnalyticsError::FeatureNotFound(name.to_string()))?;
        let dtype = column.dtype();
        Ok(dtype.is_integer() || matches!(dtype, DataType::Boolean | DataType::String))
    }

    /// Values of one column as `f64`
    pub fn column_values(&self, name: &str) -> Result<Vec<f64>> {
        let column = self
            .frame
            .column(name)
            .map_err(|_| AnalyticsError::FeatureNotFound(name.to_string()))?;
        let series = column.as_materialized_series();

        if series.dtype() == &DataType::String {
            let ca = series.str()?;
            let mut categories: Vec<&str> = ca.into_iter().flatten().collect();
            categories.sort_unstable();
            categories.dedup();

            return Ok(ca
                .into_iter()
                .map(|v| {
                    v.and_then(|s| categories.binary_search(&s).ok())
                        .map(|code| code as f64)
                        .unwrap_or(0.0)
                })
                .collect());
        }

        let series_f64 = series.cast(&DataType::Float64)?;
        Ok(series_f64
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()).unwrap_or(0.0))
            .collect())
    }

    /// Row-major feature matrix over the named columns
    pub fn feature_matrix(&self, columns: &[String]) -> Result<Array2<f64>> {
        let n_rows = self.n_rows();
        let col_data: Vec<Vec<f64>> = columns
            .iter()
            .map(|name| self.column_values(name))
            .collect::<Result<_>>()?;

        Ok(Array2::from_shape_fn((n_rows, columns.len()), |(r, c)| col_data[c][r]))
    }

    /// Class labels of the label column
    pub fn labels(&self, label_column: &str) -> Result<Vec<i64>> {
        let column = self
            .frame
            .column(label_column)
            .map_err(|_| AnalyticsError::FeatureNotFound(label_column.to_string()))?;
        let series = column.as_materialized_series().cast(&DataType::Float64)?;

        series
            .f64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| match v {
                Some(x) if x.is_finite() && x.fract() == 0.0 => Ok(x as i64),
                Some(x) if x.is_finite() => Err(AnalyticsError::ValidationError(format!(
                    "label '{}' is not a whole number at row {}: {}",
                    label_column, row, x
                ))),
                _ => Err(AnalyticsError::ValidationError(format!(
                    "label '{}' is missing or not numeric at row {}",
                    label_column, row
                ))),
            })
            .collect()
    }

    /// Count of rows per label value
    pub fn label_histogram(&self, label_column: &str) -> Result<BTreeMap<i64, usize>> {
        let mut histogram = BTreeMap::new();
        for label in self.labels(label_column)? {
            *histogram.entry(label).or_insert(0) += 1;
        }
        Ok(histogram)
    }

    /// Row count, feature display names and label counts
    pub fn summary(&self, label_column: &str) -> Result<DataSummary> {
        let features = self.feature_columns(label_column);
        Ok(DataSummary {
            total_rows: self.n_rows(),
            feature_count: self.n_columns().saturating_sub(1),
            features: display_names(&features),
            label_distribution: self.label_histogram(label_column)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DataFrame {
        df!(
            "stress_level_dataset.anxiety_level" => &[14i64, 15, 12, 16],
            "stress_level_dataset.sleep_quality" => &[2.0, 1.5, 3.0, 1.0],
            "stress_level_dataset.stress_level" => &[1i64, 2, 0, 2]
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("t.anxiety_level"), "anxiety_level");
        assert_eq!(normalize_column_name("db.t.safety"), "safety");
        assert_eq!(normalize_column_name("bullying"), "bullying");
    }

    #[test]
    fn test_prefixes_are_stripped() {
        let dataset = Dataset::from_frame(sample_frame()).unwrap();
        assert_eq!(
            dataset.column_names(),
            vec!["anxiety_level", "sleep_quality", "stress_level"]
        );
        assert_eq!(dataset.feature_columns("stress_level"), vec!["anxiety_level", "sleep_quality"]);
    }

    #[test]
    fn test_feature_matrix_and_labels() {
        let dataset = Dataset::from_frame(sample_frame()).unwrap();
        let features = dataset.feature_columns("stress_level");
        let x = dataset.feature_matrix(&features).unwrap();
        assert_eq!(x.dim(), (4, 2));
        assert_eq!(x[[1, 0]], 15.0);
        assert_eq!(x[[2, 1]], 3.0);

        let labels = dataset.labels("stress_level").unwrap();
        assert_eq!(labels, vec![1, 2, 0, 2]);

        let histogram = dataset.label_histogram("stress_level").unwrap();
        assert_eq!(histogram.get(&2), Some(&2));
        assert_eq!(histogram.get(&0), Some(&1));
    }

    #[test]
    fn test_categorical_columns_are_encoded() {
        let frame = df!(
            "living_conditions" => &["poor", "good", "fair", "good"],
            "stress_level" => &[2i64, 0, 1, 0]
        )
        .unwrap();
        let dataset = Dataset::from_frame(frame).unwrap();
        let values = dataset.column_values("living_conditions").unwrap();
        // fair=0, good=1, poor=2
        assert_eq!(values, vec![2.0, 1.0, 0.0, 1.0]);
        assert!(dataset.is_integral("living_conditions").unwrap());
    }

    #[test]
    fn test_missing_label_is_rejected() {
        let frame = df!(
            "safety" => &[1.0, 2.0],
            "stress_level" => &[Some(1i64), None]
        )
        .unwrap();
        let dataset = Dataset::from_frame(frame).unwrap();
        assert!(matches!(
            dataset.labels("stress_level"),
            Err(AnalyticsError::ValidationError(_))
        ));
    }

    #[test]
    fn test_fractional_label_is_rejected() {
        let frame = df!(
            "safety" => &[1.0, 2.0, 3.0],
            "stress_level" => &[1.0, 1.4, 2.0]
        )
        .unwrap();
        let dataset = Dataset::from_frame(frame).unwrap();
        match dataset.labels("stress_level") {
            Err(AnalyticsError::ValidationError(msg)) => assert!(msg.contains("row 1"), "{msg}"),
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_whole_float_labels_are_accepted() {
        let frame = df!(
            "safety" => &[1.0, 2.0],
            "stress_level" => &[0.0, 2.0]
        )
        .unwrap();
        let dataset = Dataset::from_frame(frame).unwrap();
        assert_eq!(dataset.labels("stress_level").unwrap(), vec![0, 2]);
    }

    #[test]
    fn test_colliding_prefixed_columns() {
        let frame = df!(
            "students.id" => &[1i64, 2],
            "surveys.id" => &[3i64, 4],
            "stress_level" => &[0i64, 1]
        )
        .unwrap();
        match Dataset::from_frame(frame) {
            Err(AnalyticsError::ValidationError(msg)) => assert!(msg.contains("'id'"), "{msg}"),
            other => panic!("expected a validation error, got {:?}", other.map(|d| d.column_names())),
        }
    }

    #[test]
    fn test_summary() {
        let dataset = Dataset::from_frame(sample_frame()).unwrap();
        let summary = dataset.summary("stress_level").unwrap();

        assert_eq!(summary.total_rows, 4);
        assert_eq!(summary.feature_count, 2);
        assert_eq!(summary.features, vec!["Anxiety Level", "Sleep Quality"]);
        assert_eq!(summary.label_distribution, BTreeMap::from([(0, 1), (1, 1), (2, 2)]));
    }

    #[test]
    fn test_unknown_column() {
        let dataset = Dataset::from_frame(sample_frame()).unwrap();
        assert!(matches!(
            dataset.column_values("noise_level"),
            Err(AnalyticsError::FeatureNotFound(_))
        ));
    }
}
