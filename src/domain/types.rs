//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and inversion
//! - exported to JSON
//! - reloaded later by the lookup commands

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::math::{mean_and_std, transpose_columns};

/// Concrete model form fitted to a luminance curve.
///
/// The order of `ModelKind::ALL` is the order models are fitted, reported and
/// plotted (`plot_<index>.png`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// `A·exp(B·x) + C`
    #[value(alias = "exp")]
    Exponential,
    /// `A·ln(x) + B`
    #[value(alias = "ln")]
    Logarithmic,
    /// `A·x² + B·x + C`
    #[value(alias = "poly2")]
    Quadratic,
    /// `A·x³ + B·x² + C·x + D`
    #[value(alias = "poly3")]
    Cubic,
    /// `A·(x+B)^C + D`
    #[value(name = "power", alias = "pow")]
    #[serde(rename = "power")]
    PowerLaw,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Exponential,
        ModelKind::Logarithmic,
        ModelKind::Quadratic,
        ModelKind::Cubic,
        ModelKind::PowerLaw,
    ];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Exponential => "Exponential",
            ModelKind::Logarithmic => "Logarithmic",
            ModelKind::Quadratic => "Quadratic",
            ModelKind::Cubic => "Cubic",
            ModelKind::PowerLaw => "Power law",
        }
    }

    /// Number of free parameters.
    pub fn param_count(self) -> usize {
        match self {
            ModelKind::Logarithmic => 2,
            ModelKind::Exponential | ModelKind::Quadratic => 3,
            ModelKind::Cubic | ModelKind::PowerLaw => 4,
        }
    }

    /// Position in `ModelKind::ALL`; used to name chart files.
    pub fn index(self) -> usize {
        match self {
            ModelKind::Exponential => 0,
            ModelKind::Logarithmic => 1,
            ModelKind::Quadratic => 2,
            ModelKind::Cubic => 3,
            ModelKind::PowerLaw => 4,
        }
    }
}

/// Which model(s) to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelSpec {
    All,
    #[value(alias = "exp")]
    Exponential,
    #[value(alias = "ln")]
    Logarithmic,
    #[value(alias = "poly2")]
    Quadratic,
    #[value(alias = "poly3")]
    Cubic,
    #[value(name = "power", alias = "pow")]
    #[serde(rename = "power")]
    PowerLaw,
}

impl ModelSpec {
    pub fn kinds(self) -> Vec<ModelKind> {
        match self {
            ModelSpec::All => ModelKind::ALL.to_vec(),
            ModelSpec::Exponential => vec![ModelKind::Exponential],
            ModelSpec::Logarithmic => vec![ModelKind::Logarithmic],
            ModelSpec::Quadratic => vec![ModelKind::Quadratic],
            ModelSpec::Cubic => vec![ModelKind::Cubic],
            ModelSpec::PowerLaw => vec![ModelKind::PowerLaw],
        }
    }
}

/// Repeated measurements over a shared independent-variable grid.
///
/// Each row is one measurement repetition; column `j` of every row was taken
/// at `x[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    x: Vec<f64>,
    rows: Vec<Vec<f64>>,
}

impl SampleSet {
    /// Build a sample set, checking that every repetition row matches the grid.
    pub fn new(x: Vec<f64>, rows: Vec<Vec<f64>>) -> Result<Self, String> {
        if x.is_empty() {
            return Err("independent-variable grid is empty".to_string());
        }
        if rows.is_empty() {
            return Err("no measurement rows".to_string());
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != x.len() {
                return Err(format!(
                    "repetition {} has {} values, expected {}",
                    i + 1,
                    row.len(),
                    x.len()
                ));
            }
        }
        Ok(Self { x, rows })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn repetitions(&self) -> usize {
        self.rows.len()
    }

    /// Mean and population standard deviation across repetitions, per x.
    pub fn reduce(&self) -> ReducedCurve {
        let columns = transpose_columns(&self.rows, self.x.len());
        let (mean, std): (Vec<f64>, Vec<f64>) = columns.iter().map(|c| mean_and_std(c)).unzip();
        ReducedCurve {
            x: self.x.clone(),
            mean,
            std,
            repetitions: self.rows.len(),
        }
    }
}

/// Per-x mean and standard deviation of a `SampleSet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducedCurve {
    pub x: Vec<f64>,
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    pub repetitions: usize,
}

impl ReducedCurve {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn stats(&self) -> DatasetStats {
        let fold = |v: &[f64]| {
            v.iter()
                .copied()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| (lo.min(x), hi.max(x)))
        };
        let (x_min, x_max) = fold(&self.x);
        let (y_min, y_max) = fold(&self.mean);
        DatasetStats {
            n_points: self.x.len(),
            repetitions: self.repetitions,
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }
}

/// Summary stats about the reduced curve actually fitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n_points: usize,
    pub repetitions: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// A model kind together with concrete parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub kind: ModelKind,
    pub params: Vec<f64>,
}

/// Least-squares output for one model against one reduced curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    pub model: FittedModel,
    /// Row-major `p × p` parameter covariance. `+inf` when not estimable.
    pub covariance: Vec<Vec<f64>>,
    pub sse: f64,
    pub rmse: f64,
    pub iterations: usize,
}

impl FitResult {
    pub fn kind(&self) -> ModelKind {
        self.model.kind
    }

    pub fn params(&self) -> &[f64] {
        &self.model.params
    }

    /// One-sigma parameter uncertainties (square roots of the covariance diagonal).
    pub fn std_errors(&self) -> Vec<f64> {
        self.covariance
            .iter()
            .enumerate()
            .map(|(i, row)| row.get(i).copied().unwrap_or(f64::NAN).sqrt())
            .collect()
    }
}

/// What an inversion should match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InversionTarget {
    /// Target luminance (cd/m²).
    Luminance(f64),
    /// Target contrast between a symmetric pixel pair.
    Contrast(f64),
}

/// Result of an inversion grid search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Inversion {
    /// Single pixel intensity matching a target luminance.
    Pixel { x: f64, value: f64 },
    /// Symmetric pixel pair `(-x, x)` matching a target contrast.
    Pair { low: f64, high: f64, contrast: f64 },
}
