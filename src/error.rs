//! Error types for the stress analytics backend

use thiserror::Error;

/// Result type alias for analytics operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Main error type for data loading, training, reporting and rendering
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("No feature columns available besides label '{0}'")]
    NoFeatures(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Warehouse error: {0}")]
    WarehouseError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<polars::error::PolarsError> for AnalyticsError {
    fn from(err: polars::error::PolarsError) -> Self {
        AnalyticsError::DataError(err.to_string())
    }
}

impl From<rusqlite::Error> for AnalyticsError {
    fn from(err: rusqlite::Error) -> Self {
        AnalyticsError::WarehouseError(err.to_string())
    }
}

impl From<image::ImageError> for AnalyticsError {
    fn from(err: image::ImageError) -> Self {
        AnalyticsError::RenderError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for AnalyticsError {
    fn from(err: ndarray::ShapeError) -> Self {
        AnalyticsError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
