//! Run summaries and the console lines printed by the lookup commands.
//!
//! Lookup results are rounded to two decimals; the grid step is printed with
//! enough precision to show the quantisation bound.

use std::path::Path;

use crate::domain::{DatasetStats, Inversion};
use crate::fit::FitBatch;

/// Format the full `lum fit` summary (dataset stats + per-model diagnostics).
pub fn format_run_summary(source: &Path, stats: &DatasetStats, batch: &FitBatch) -> String {
    let mut out = String::new();

    out.push_str("=== lum - luminance curve fit ===\n");
    out.push_str(&format!("Input: {}\n", source.display()));
    out.push_str(&format!(
        "Points: n={} | repetitions={} | x=[{:.3}, {:.3}] | y=[{:.2}, {:.2}] cd/m^2\n",
        stats.n_points, stats.repetitions, stats.x_min, stats.x_max, stats.y_min, stats.y_max
    ));

    out.push_str("\nModel fits:\n");
    for fit in &batch.fits {
        out.push_str(&format!(
            "  {:<12} SSE={:.3} RMSE={:.3} iterations={}\n",
            fit.kind().display_name(),
            fit.sse,
            fit.rmse,
            fit.iterations
        ));
        out.push_str(&format!("    {}\n", fit.kind().equation(fit.params())));
        out.push_str(&format!("    params: {}\n", fmt_vec(fit.params())));
        out.push_str(&format!("    std err: {}\n", fmt_vec(&fit.std_errors())));
    }
    for (kind, reason) in &batch.skipped {
        out.push_str(&format!("  (skipped {}) {reason}\n", kind.display_name()));
    }

    out
}

pub fn format_luminance_line(pixel: f64, luminance: f64) -> String {
    format!(
        "Pixel intensity (between -1 and +1): {pixel:.2}\n\
         Corresponding luminance: {luminance:.2} [cd / m^2]"
    )
}

/// Console lines for an inversion answer; `step` is the search grid spacing.
pub fn format_inversion(target: f64, inversion: &Inversion, step: f64) -> String {
    match *inversion {
        Inversion::Pixel { x, .. } => format!(
            "Target luminance value: {target:.2} [cd / m^2]\n\
             Corresponding pixel intensity: {x:.2} (grid step {step:.2e})"
        ),
        Inversion::Pair { low, high, .. } => format!(
            "Given the target value: {target:.2}\n\
             Pixel intensities should be set to: {low:.2} and {high:.2} \
             (grid step {step:.2e})"
        ),
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.4}")).collect();
    format!("[{}]", parts.join(", "))
}
