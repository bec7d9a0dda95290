//! HTTP request handlers
//!
//! Each handler reloads the dataset and retrains from scratch inside
//! `spawn_blocking`, so concurrent requests never share model state.

use std::sync::Arc;
use axum::{extract::State, Json};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Value};
use tracing::info;

use crate::data::display_name;
use crate::render;
use crate::reporting::{feature_importance, FeatureImportance};

use super::error::{Result, ServerError};
use super::state::AppState;

const MODEL_TYPE: &str = "Random Forest Classifier";
const TOP_FEATURES: usize = 5;

/// Run CPU-bound work off the async runtime, tagging failures with `context`
async fn blocking<T, F>(context: &'static str, work: F) -> Result<T>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await?
        .map_err(ServerError::analytics(context))
}

/// Importances as a JSON object keyed by display name, in ranking order
struct RankedImportances<'a>(&'a [FeatureImportance]);

impl Serialize for RankedImportances<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for fi in self.0 {
            map.serialize_entry(&display_name(&fi.feature), &fi.importance)?;
        }
        map.end()
    }
}

// ============================================================================
// Data Handlers
// ============================================================================

pub async fn data_summary(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let summary = blocking("Unable to read data", move || {
        let dataset = state.load_dataset()?;
        dataset.summary(state.label_column())
    })
    .await?;

    Ok(Json(json!({
        "status": "success",
        "summary": summary,
    })))
}

// ============================================================================
// Model Handlers
// ============================================================================

pub async fn train_model(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let (accuracy, ranked) = blocking("Model training failed", move || {
        let outcome = state.train()?;
        let ranked = feature_importance(&outcome.model, &outcome.features)?;
        Ok((outcome.accuracy, ranked))
    })
    .await?;

    info!(accuracy, features = ranked.len(), "Training request completed");
    Ok(Json(json!({
        "status": "success",
        "message": "Model trained successfully",
        "accuracy": accuracy,
        "feature_importance": RankedImportances(&ranked),
    })))
}

pub async fn model_info(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let (outcome, ranked) = blocking("Unable to get model information", move || {
        let outcome = state.train()?;
        let ranked = feature_importance(&outcome.model, &outcome.features)?;
        Ok((outcome, ranked))
    })
    .await?;

    let top_features: Vec<Value> = ranked
        .iter()
        .take(TOP_FEATURES)
        .map(|fi| json!({ "name": display_name(&fi.feature), "importance": fi.importance }))
        .collect();

    Ok(Json(json!({
        "status": "success",
        "model_type": MODEL_TYPE,
        "n_estimators": outcome.model.n_trees(),
        "accuracy": outcome.accuracy,
        "feature_count": outcome.features.len(),
        "top_features": top_features,
    })))
}

// ============================================================================
// Chart Handlers
// ============================================================================

pub async fn model_plots(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let plots = blocking("Unable to generate charts", move || {
        let trained = state.train_for_reports()?;
        let inputs = trained.report_inputs()?;
        Ok(render::model_plots(&inputs))
    })
    .await?;

    Ok(Json(json!({
        "status": "success",
        "plots": plots,
    })))
}

pub async fn auc_roc_plot(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let image = blocking("Unable to generate the ROC curve", move || {
        let trained = state.train_for_reports()?;
        let inputs = trained.report_inputs()?;
        render::auc_roc_plot(&inputs)
    })
    .await?;

    Ok(Json(json!({
        "status": "success",
        "auc_roc_plot": image,
    })))
}

// ============================================================================
// System Handlers
// ============================================================================

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
