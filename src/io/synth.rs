//! Synthetic measurement tables.
//!
//! Generates repetition rows from a known model plus seeded Gaussian noise, in
//! the same layout `ingest` reads. Used by `lum synth` to dry-run the pipeline
//! without a photometer, and by the integration tests.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use tracing::info;

use crate::domain::FittedModel;
use crate::error::AppError;
use crate::math::linspace;

#[derive(Debug, Clone)]
pub struct SynthSpec {
    pub model: FittedModel,
    /// Columns per row (pixel intensities spread over `x_range`).
    pub samples: usize,
    pub repetitions: usize,
    /// Standard deviation of the additive noise, in luminance units.
    pub noise_sd: f64,
    pub seed: u64,
    pub x_range: [f64; 2],
}

impl SynthSpec {
    fn validate(&self) -> Result<(), AppError> {
        self.model.validate().map_err(AppError::InvalidConfig)?;
        if self.samples < 2 || self.repetitions == 0 {
            return Err(AppError::InvalidConfig(format!(
                "synthetic table needs >= 2 samples and >= 1 repetition (got {} x {})",
                self.repetitions, self.samples
            )));
        }
        if !(self.noise_sd.is_finite() && self.noise_sd >= 0.0) {
            return Err(AppError::InvalidConfig(format!(
                "noise standard deviation must be finite and >= 0 (got {})",
                self.noise_sd
            )));
        }
        Ok(())
    }
}

/// Generate the repetition rows; the same seed always yields the same table.
pub fn generate_rows(spec: &SynthSpec) -> Result<Vec<Vec<f64>>, AppError> {
    spec.validate()?;
    let x = linspace(spec.x_range[0], spec.x_range[1], spec.samples);
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, spec.noise_sd)
        .map_err(|e| AppError::InvalidConfig(format!("noise distribution: {e}")))?;

    let rows = (0..spec.repetitions)
        .map(|_| {
            x.iter()
                .map(|&xi| spec.model.predict(xi) + normal.sample(&mut rng))
                .collect()
        })
        .collect();
    Ok(rows)
}

/// Write a synthetic table to `path`, preceded by a `#` comment naming the model.
pub fn write_synthetic_csv(path: &Path, spec: &SynthSpec) -> Result<(), AppError> {
    let rows = generate_rows(spec)?;
    let file = File::create(path).map_err(|e| {
        AppError::io(format!("Failed to create synthetic CSV '{}'", path.display()), e)
    })?;
    let mut out = BufWriter::new(file);
    writeln!(
        out,
        "# synthetic: {} (noise sd {}, seed {})",
        spec.model.kind.equation(&spec.model.params),
        spec.noise_sd,
        spec.seed
    )
    .map_err(|e| AppError::io("Failed to write synthetic CSV header", e))?;

    {
        let mut writer = csv::Writer::from_writer(&mut out);
        for row in &rows {
            writer
                .write_record(row.iter().map(|v| format!("{v:.6}")))
                .map_err(|e| AppError::io("Failed to write synthetic CSV row", e.into()))?;
        }
        writer
            .flush()
            .map_err(|e| AppError::io("Failed to flush synthetic CSV", e))?;
    }
    out.flush()
        .map_err(|e| AppError::io("Failed to flush synthetic CSV", e))?;

    info!(
        path = %path.display(),
        repetitions = spec.repetitions,
        samples = spec.samples,
        "wrote synthetic table"
    );
    Ok(())
}
