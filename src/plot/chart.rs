//! Plotters-powered model comparison charts.
//!
//! Each chart shows:
//! - the mean luminance per pixel intensity with ±1 SD error bars
//! - the fitted model evaluated densely over the x-axis limits
//! - the fitted equation as the series label
//!
//! Axis limits, labels and title come from `RunConfig`. Text (title, axis
//! labels, legend) needs the `ttf` feature: plotters' built-in font cannot
//! rasterise glyphs, so without it the charts carry the mesh, bars and model
//! line only. Files are named
//! `plot_<index>.png` where `index` is the model's position in
//! `ModelKind::ALL`, so a run that skips a model leaves a gap rather than
//! renumbering.

use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::{info, warn};

use crate::domain::{FitResult, ReducedCurve, RunConfig};
use crate::error::AppError;
use crate::math::linspace;

const CHART_SIZE: (u32, u32) = (1024, 768);
const CURVE_POINTS: usize = 400;

/// Whether a glyph-capable font backend is compiled in.
pub const CHART_TEXT: bool = cfg!(feature = "ttf");

fn plot_err(e: impl std::fmt::Display) -> AppError {
    AppError::Plot(e.to_string())
}

/// Render one chart per fit into `config.output_dir`.
///
/// A chart that fails to render is logged and skipped; the paths actually
/// written are returned.
pub fn render_model_charts(
    curve: &ReducedCurve,
    fits: &[FitResult],
    config: &RunConfig,
) -> Result<Vec<PathBuf>, AppError> {
    std::fs::create_dir_all(&config.output_dir).map_err(|e| {
        AppError::io(
            format!("Failed to create output directory '{}'", config.output_dir.display()),
            e,
        )
    })?;

    let mut written = Vec::with_capacity(fits.len());
    for fit in fits {
        let path = config.chart_path(fit.kind().index());
        match render_model_chart(&path, curve, fit, config) {
            Ok(()) => {
                info!(path = %path.display(), model = fit.kind().display_name(), "wrote chart");
                written.push(path);
            }
            Err(err) => warn!(model = fit.kind().display_name(), "chart skipped: {err}"),
        }
    }
    Ok(written)
}

/// Render a single model chart to `path`.
pub fn render_model_chart(
    path: &Path,
    curve: &ReducedCurve,
    fit: &FitResult,
    config: &RunConfig,
) -> Result<(), AppError> {
    let [x0, x1] = config.x_limits;
    let [y0, y1] = config.y_limits;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut builder = ChartBuilder::on(&root);
    builder.margin(16);
    // No label area means plotters never lays out tick text.
    if CHART_TEXT {
        builder
            .caption(&config.title, ("sans-serif", 24))
            .x_label_area_size(48)
            .y_label_area_size(64);
    }
    let mut chart = builder.build_cartesian_2d(x0..x1, y0..y1).map_err(plot_err)?;

    let mut mesh = chart.configure_mesh();
    mesh.x_labels(11).y_labels(8);
    if CHART_TEXT {
        mesh.x_desc(config.x_label.as_str()).y_desc(config.y_label.as_str());
    }
    mesh.draw().map_err(plot_err)?;

    // 1) Measured means with ±SD bars.
    let bar_color = RGBColor(30, 30, 30);
    chart
        .draw_series(curve.x.iter().zip(&curve.mean).zip(&curve.std).map(
            |((&x, &m), &s)| ErrorBar::new_vertical(x, m - s, m, m + s, bar_color.filled(), 8),
        ))
        .map_err(plot_err)?
        .label("Mean ± SD")
        .legend(move |(x, y)| PathElement::new(vec![(x, y - 6), (x, y + 6)], bar_color));

    // 2) Model line; points outside the model's domain are dropped.
    let model_color = RGBColor(200, 30, 30);
    let line: Vec<(f64, f64)> = linspace(x0, x1, CURVE_POINTS)
        .into_iter()
        .map(|x| (x, fit.model.predict(x)))
        .filter(|(_, y)| y.is_finite())
        .collect();
    chart
        .draw_series(LineSeries::new(line, model_color.stroke_width(2)))
        .map_err(plot_err)?
        .label(fit.kind().equation(fit.params()))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], model_color));

    if CHART_TEXT {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    Ok(())
}
