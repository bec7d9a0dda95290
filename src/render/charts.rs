//! One chart per report
//!
//! Each `*_chart` function renders a report into a base64 PNG. Text is drawn
//! only when [`text_available`] reports a registered font.

use super::canvas::{
    blues, draw_frame, font, render_err, render_png, series_color, text_available, Area,
};
use crate::data::display_name;
use crate::error::Result;
use crate::reporting::{ClassificationReport, ConfusionMatrix, FeatureDensity, FeatureImportance, RocReport};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

/// Label for integer tick `v` when it lands on a category index
fn category_label(v: f64, names: &[String]) -> String {
    let r = v.round();
    if (v - r).abs() > 1e-6 || r < 0.0 || r as usize >= names.len() {
        return String::new();
    }
    names[r as usize].clone()
}

/// Horizontal bars, most important feature on top
pub fn importance_chart(ranked: &[FeatureImportance]) -> Result<String> {
    render_png(1000, 800, |root| draw_importance(root, ranked))
}

fn draw_importance(root: &Area<'_>, ranked: &[FeatureImportance]) -> Result<()> {
    let text = text_available();
    let n = ranked.len().max(1);
    let x_max = ranked.iter().map(|r| r.importance).fold(0.0, f64::max).max(1e-9) * 1.1;
    // Row 0 at the top
    let names: Vec<String> = ranked
        .iter()
        .rev()
        .map(|r| display_name(&r.feature))
        .collect();

    let mut builder = ChartBuilder::on(root);
    builder.margin(20);
    if text {
        builder
            .caption("Random Forest Feature Importance", font(24))
            .x_label_area_size(50)
            .y_label_area_size(180);
    }
    let mut chart = builder
        .build_cartesian_2d(0.0..x_max, -0.5..(n as f64 - 0.5))
        .map_err(render_err)?;

    if text {
        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n)
            .y_label_formatter(&|v| category_label(*v, &names))
            .x_desc("Importance")
            .label_style(font(14))
            .axis_desc_style(font(16))
            .draw()
            .map_err(render_err)?;
    } else {
        draw_frame(chart.plotting_area())?;
    }

    let bar = series_color(0).filled();
    chart
        .draw_series(ranked.iter().rev().enumerate().map(|(i, r)| {
            let y = i as f64;
            Rectangle::new([(0.0, y - 0.4), (r.importance, y + 0.4)], bar)
        }))
        .map_err(render_err)?;

    Ok(())
}

/// Annotated heat map, true labels down and predicted labels across
pub fn confusion_chart(cm: &ConfusionMatrix) -> Result<String> {
    render_png(800, 600, |root| draw_confusion(root, cm))
}

fn draw_confusion(root: &Area<'_>, cm: &ConfusionMatrix) -> Result<()> {
    let text = text_available();
    let n = cm.n_classes().max(1);
    let max = cm.max_count().max(1) as f64;
    let across: Vec<String> = cm.labels.iter().map(|l| l.to_string()).collect();
    let down: Vec<String> = across.iter().rev().cloned().collect();

    let mut builder = ChartBuilder::on(root);
    builder.margin(20);
    if text {
        builder
            .caption("Confusion Matrix", font(24))
            .x_label_area_size(50)
            .y_label_area_size(60);
    }
    let extent = -0.5..(n as f64 - 0.5);
    let mut chart = builder
        .build_cartesian_2d(extent.clone(), extent)
        .map_err(render_err)?;

    if text {
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(n)
            .y_labels(n)
            .x_label_formatter(&|v| category_label(*v, &across))
            .y_label_formatter(&|v| category_label(*v, &down))
            .x_desc("Predicted Label")
            .y_desc("True Label")
            .label_style(font(14))
            .axis_desc_style(font(16))
            .draw()
            .map_err(render_err)?;
    }

    let cells = cm.counts.iter().enumerate().flat_map(|(i, row)| {
        row.iter().enumerate().map(move |(j, &count)| (i, j, count))
    });
    chart
        .draw_series(cells.clone().map(|(i, j, count)| {
            let (x, y) = (j as f64, (n - 1 - i) as f64);
            Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                blues(count as f64 / max).filled(),
            )
        }))
        .map_err(render_err)?;

    if text {
        chart
            .draw_series(cells.map(|(i, j, count)| {
                let color = if count as f64 / max > 0.5 { WHITE } else { BLACK };
                let style = font(16)
                    .color(&color)
                    .pos(Pos::new(HPos::Center, VPos::Center));
                Text::new(count.to_string(), (j as f64, (n - 1 - i) as f64), style)
            }))
            .map_err(render_err)?;
    } else {
        draw_frame(chart.plotting_area())?;
    }

    Ok(())
}

/// 2x2 grid of per-label density curves
pub fn distribution_chart(densities: &[FeatureDensity]) -> Result<String> {
    render_png(1200, 800, |root| {
        let panels = root.split_evenly((2, 2));
        for (panel, density) in panels.iter().zip(densities) {
            draw_density(panel, density)?;
        }
        Ok(())
    })
}

fn draw_density(area: &Area<'_>, density: &FeatureDensity) -> Result<()> {
    let text = text_available();
    let shown = display_name(&density.feature);

    let (x_min, x_max, y_max) = density.curves.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0f64),
        |(lo, hi, top), c| {
            let lo = c.xs.first().map_or(lo, |&x| lo.min(x));
            let hi = c.xs.last().map_or(hi, |&x| hi.max(x));
            let top = c.ys.iter().copied().fold(top, f64::max);
            (lo, hi, top)
        },
    );
    let (x_min, x_max) = if x_min < x_max { (x_min, x_max) } else { (0.0, 1.0) };
    let y_max = if y_max > 0.0 { y_max * 1.05 } else { 1.0 };

    let mut builder = ChartBuilder::on(area);
    builder.margin(15);
    if text {
        builder
            .caption(format!("Feature: {shown}"), font(18))
            .x_label_area_size(40)
            .y_label_area_size(55);
    }
    let mut chart = builder
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)
        .map_err(render_err)?;

    if text {
        chart
            .configure_mesh()
            .x_desc(shown.as_str())
            .y_desc("Density")
            .label_style(font(12))
            .axis_desc_style(font(14))
            .draw()
            .map_err(render_err)?;
    } else {
        draw_frame(chart.plotting_area())?;
    }

    for (i, curve) in density.curves.iter().enumerate() {
        let color = series_color(i);
        let points = curve.xs.iter().copied().zip(curve.ys.iter().copied());
        let series = chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))
            .map_err(render_err)?;
        if text {
            series
                .label(format!("Stress Level {}", curve.label))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }
    }

    if text && !density.curves.is_empty() {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(font(12))
            .draw()
            .map_err(render_err)?;
    }

    Ok(())
}

/// Grouped precision, recall and F1 bars per class
pub fn classification_chart(report: &ClassificationReport) -> Result<String> {
    render_png(1000, 600, |root| draw_classification(root, report))
}

fn draw_classification(root: &Area<'_>, report: &ClassificationReport) -> Result<()> {
    const WIDTH: f64 = 0.25;
    let text = text_available();
    let n = report.classes.len().max(1);
    let names: Vec<String> = report.classes.iter().map(|c| c.label.to_string()).collect();

    let mut builder = ChartBuilder::on(root);
    builder.margin(20);
    if text {
        builder
            .caption("Classification Performance by Stress Level", font(24))
            .x_label_area_size(50)
            .y_label_area_size(60);
    }
    let mut chart = builder
        .build_cartesian_2d(-0.5..(n as f64 - 0.5), 0.0..1.0)
        .map_err(render_err)?;

    if text {
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|v| category_label(*v, &names))
            .x_desc("Stress Level")
            .y_desc("Score")
            .label_style(font(14))
            .axis_desc_style(font(16))
            .draw()
            .map_err(render_err)?;
    } else {
        draw_frame(chart.plotting_area())?;
    }

    let metrics: [(&str, fn(&crate::reporting::ClassMetrics) -> f64); 3] = [
        ("Precision", |c| c.precision),
        ("Recall", |c| c.recall),
        ("F1", |c| c.f1),
    ];
    for (k, (name, value)) in metrics.iter().enumerate() {
        let color = series_color(k);
        let offset = (k as f64 - 1.0) * WIDTH;
        let series = chart
            .draw_series(report.classes.iter().enumerate().map(|(i, c)| {
                let x = i as f64 + offset;
                Rectangle::new([(x - WIDTH / 2.0, 0.0), (x + WIDTH / 2.0, value(c))], color.filled())
            }))
            .map_err(render_err)?;
        if text {
            series
                .label(*name)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
    }

    if text {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(font(14))
            .draw()
            .map_err(render_err)?;
    }

    Ok(())
}

/// ROC curves with the chance diagonal
pub fn roc_chart(report: &RocReport) -> Result<String> {
    render_png(1000, 800, |root| draw_roc(root, report))
}

fn draw_roc(root: &Area<'_>, report: &RocReport) -> Result<()> {
    let text = text_available();

    let mut builder = ChartBuilder::on(root);
    builder.margin(20);
    if text {
        builder
            .caption("Receiver Operating Characteristic (ROC)", font(24))
            .x_label_area_size(50)
            .y_label_area_size(60);
    }
    let mut chart = builder
        .build_cartesian_2d(0.0..1.0, 0.0..1.05)
        .map_err(render_err)?;

    if text {
        chart
            .configure_mesh()
            .x_desc("False Positive Rate")
            .y_desc("True Positive Rate")
            .label_style(font(14))
            .axis_desc_style(font(16))
            .draw()
            .map_err(render_err)?;
    } else {
        draw_frame(chart.plotting_area())?;
    }

    for (i, curve) in report.curves.iter().enumerate() {
        let color = series_color(i);
        let points = curve.fpr.iter().copied().zip(curve.tpr.iter().copied());
        let series = chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))
            .map_err(render_err)?;
        if text {
            let label = if report.binary {
                format!("ROC curve (AUC = {:.2})", curve.auc)
            } else {
                format!("ROC curve (class {}, AUC = {:.2})", curve.label, curve.auc)
            };
            series
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }
    }

    chart
        .draw_series(LineSeries::new(vec![(0.0, 0.0), (1.0, 1.0)], BLACK.stroke_width(2)))
        .map_err(render_err)?;

    if text {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(font(14))
            .draw()
            .map_err(render_err)?;
    }

    Ok(())
}
