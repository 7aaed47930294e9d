//! Shared "fit pipeline" logic used by `lum fit` and the integration tests.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load table -> reduce repetitions -> fit model set -> (charts)
//!
//! The CLI layer can then focus on presentation and exports.

use std::path::PathBuf;

use tracing::info;

use crate::domain::{ModelKind, ReducedCurve, RunConfig, SampleSet};
use crate::error::AppError;
use crate::fit::{BatchOptions, FitBatch, fit_all};

/// All computed outputs of a single `lum fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub samples: SampleSet,
    pub curve: ReducedCurve,
    pub batch: FitBatch,
}

/// Execute the fitting pipeline and return the computed outputs.
pub fn run_fit(
    config: &RunConfig,
    kinds: &[ModelKind],
    opts: &BatchOptions,
) -> Result<RunOutput, AppError> {
    config.validate()?;

    // 1) Load and validate the measurement table.
    let samples = crate::io::load_sample_set(config)?;

    // 2) Mean / SD across repetitions.
    let curve = samples.reduce();

    // 3) Fit every requested model to the mean curve.
    let batch = fit_all(&curve, kinds, opts)?;
    info!(
        fitted = batch.fits.len(),
        skipped = batch.skipped.len(),
        "fit pipeline finished"
    );

    Ok(RunOutput {
        samples,
        curve,
        batch,
    })
}

/// Run the pipeline and write one chart per fitted model.
pub fn run_fit_with_charts(
    config: &RunConfig,
    kinds: &[ModelKind],
    opts: &BatchOptions,
) -> Result<(RunOutput, Vec<PathBuf>), AppError> {
    let run = run_fit(config, kinds, opts)?;
    let charts = crate::plot::render_model_charts(&run.curve, &run.batch.fits, config)?;
    Ok((run, charts))
}
