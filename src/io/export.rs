//! Export fit results (JSON) and the reduced curve (CSV).
//!
//! Fit JSON is the "portable" representation of a `lum fit` run:
//! - every fitted model (kind, coefficients, covariance, SSE/RMSE, equation)
//! - the source table and a UTC generation timestamp
//!
//! The lookup commands read it back with `--fit`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{FitResult, FittedModel, ModelKind, ReducedCurve};
use crate::error::AppError;

/// One model entry in a fit JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub model: ModelKind,
    pub params: Vec<f64>,
    /// `null` entries stand for non-estimable (infinite) covariance.
    pub covariance: Vec<Vec<Option<f64>>>,
    pub sse: f64,
    pub rmse: f64,
    pub equation: String,
}

impl ModelRecord {
    pub fn from_fit(fit: &FitResult) -> Self {
        let covariance = fit
            .covariance
            .iter()
            .map(|row| row.iter().map(|&v| v.is_finite().then_some(v)).collect())
            .collect();
        Self {
            model: fit.kind(),
            params: fit.params().to_vec(),
            covariance,
            sse: fit.sse,
            rmse: fit.rmse,
            equation: fit.kind().equation(fit.params()),
        }
    }

    pub fn fitted_model(&self) -> FittedModel {
        FittedModel::new(self.model, self.params.clone())
    }
}

/// Top-level fit JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub source: PathBuf,
    pub fits: Vec<ModelRecord>,
}

impl FitReport {
    pub fn new(source: &Path, fits: &[FitResult]) -> Self {
        Self {
            tool: "lum".to_string(),
            generated_at: Utc::now(),
            source: source.to_path_buf(),
            fits: fits.iter().map(ModelRecord::from_fit).collect(),
        }
    }

    /// The fitted model of the given kind, validated.
    pub fn model(&self, kind: ModelKind) -> Result<FittedModel, AppError> {
        let record = self.fits.iter().find(|r| r.model == kind).ok_or_else(|| {
            AppError::InvalidConfig(format!(
                "fit file has no {} model",
                kind.display_name()
            ))
        })?;
        let model = record.fitted_model();
        model.validate().map_err(AppError::InvalidConfig)?;
        Ok(model)
    }
}

/// Write a fit JSON file.
pub fn write_fit_json(path: &Path, report: &FitReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create fit JSON '{}'", path.display()), e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|e| AppError::io("Failed to write fit JSON", e.into()))?;
    writer
        .flush()
        .map_err(|e| AppError::io("Failed to flush fit JSON", e))?;
    info!(path = %path.display(), models = report.fits.len(), "wrote fit JSON");
    Ok(())
}

/// Read a fit JSON file.
pub fn read_fit_json(path: &Path) -> Result<FitReport, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::data_load(path, format!("cannot open fit JSON: {e}")))?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::data_load(path, format!("invalid fit JSON: {e}")))
}

/// Write the reduced curve as an `x,mean,std` CSV table.
pub fn write_reduced_csv(path: &Path, curve: &ReducedCurve) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::io(format!("Failed to create reduced CSV '{}'", path.display()), e)
    })?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    let to_io = |e: csv::Error| AppError::io("Failed to write reduced CSV", e.into());

    writer.write_record(["x", "mean", "std"]).map_err(to_io)?;
    for i in 0..curve.len() {
        writer
            .write_record([
                format!("{:.10}", curve.x[i]),
                format!("{:.6}", curve.mean[i]),
                format!("{:.6}", curve.std[i]),
            ])
            .map_err(to_io)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::io("Failed to flush reduced CSV", e))?;
    info!(path = %path.display(), rows = curve.len(), "wrote reduced curve");
    Ok(())
}
