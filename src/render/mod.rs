//! Chart rendering
//!
//! Turns reports into base64-encoded PNG images. Drawing goes through
//! `plotters` on an in-memory bitmap; the buffer is PNG-encoded with `image`.

mod canvas;
mod charts;

pub use canvas::{placeholder_image, text_available};
pub use charts::{classification_chart, confusion_chart, distribution_chart, importance_chart, roc_chart};

use crate::error::Result;
use crate::reporting::{
    feature_distributions, feature_importance, ClassificationReport, ConfusionMatrix, ReportInputs, RocReport,
};
use serde::Serialize;
use tracing::{error, info};

/// The five diagnostic images, each a base64 PNG
#[derive(Debug, Clone, Serialize)]
pub struct ModelPlots {
    pub feature_importance: String,
    pub confusion_matrix: String,
    pub feature_distribution: String,
    pub classification_report: String,
    pub auc_roc_curve: String,
}

const PLOT_COUNT: usize = 5;

fn render_in_order(inputs: &ReportInputs<'_>, out: &mut Vec<String>) -> Result<()> {
    let ranked = feature_importance(inputs.model, inputs.features)?;
    out.push(importance_chart(&ranked)?);

    let predictions = inputs.predictions()?;
    let cm = ConfusionMatrix::from_labels(inputs.test_labels, &predictions)?;
    out.push(confusion_chart(&cm)?);

    let densities = feature_distributions(inputs)?;
    out.push(distribution_chart(&densities)?);

    let report = ClassificationReport::from_confusion(&cm);
    out.push(classification_chart(&report)?);

    out.push(auc_roc_plot(inputs)?);
    Ok(())
}

/// Render every report in a fixed order: importance, confusion matrix,
/// feature distribution, classification report, ROC.
///
/// Never fails. The first error stops the sequence and its placeholder image
/// stands in for that report and all later ones; earlier images are kept.
pub fn model_plots(inputs: &ReportInputs<'_>) -> ModelPlots {
    let mut images = Vec::with_capacity(PLOT_COUNT);

    if let Err(e) = render_in_order(inputs, &mut images) {
        error!(error = %e, rendered = images.len(), "Chart generation failed");
        let placeholder = placeholder_image(&e.to_string()).unwrap_or_else(|err| {
            error!(error = %err, "Placeholder rendering failed");
            String::new()
        });
        images.resize(PLOT_COUNT, placeholder);
    } else {
        info!("Rendered all model plots");
    }

    let mut images = images.into_iter();
    let mut next = || images.next().unwrap_or_default();
    ModelPlots {
        feature_importance: next(),
        confusion_matrix: next(),
        feature_distribution: next(),
        classification_report: next(),
        auc_roc_curve: next(),
    }
}

/// ROC curves for the test partition; binary or one-vs-rest depending on the
/// number of distinct test labels.
pub fn auc_roc_plot(inputs: &ReportInputs<'_>) -> Result<String> {
    let report = RocReport::compute(inputs)?;
    roc_chart(&report)
}
