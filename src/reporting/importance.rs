//! Feature importance ranking

use crate::error::{AnalyticsError, Result};
use crate::training::RandomForest;
use serde::Serialize;

/// One ranked feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Features sorted by importance, highest first. Ties keep dataset order.
pub fn feature_importance(model: &RandomForest, features: &[String]) -> Result<Vec<FeatureImportance>> {
    let importances = model.feature_importances().ok_or(AnalyticsError::ModelNotFitted)?;
    if importances.len() != features.len() {
        return Err(AnalyticsError::ShapeError {
            expected: format!("{} importances", features.len()),
            actual: format!("{} importances", importances.len()),
        });
    }

    let mut ranked: Vec<FeatureImportance> = features
        .iter()
        .zip(importances.iter())
        .map(|(feature, &importance)| FeatureImportance {
            feature: feature.clone(),
            importance,
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(ranked)
}
