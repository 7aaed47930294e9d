//! Command-line parsing for the `lum` luminance toolkit.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting, inversion and rendering code. Values that can also come from a
//! config file or the environment are `Option`s here; `app` resolves the
//! precedence.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::{ModelKind, ModelSpec};
use crate::fit::DEFAULT_GRID_POINTS;
use crate::tui::DEFAULT_STEPS;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "lum",
    version,
    about = "Fit and invert display luminance curves measured with a photometer"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the model set to a measurement table, print diagnostics and write charts.
    Fit(FitArgs),
    /// Predicted luminance for a pixel intensity.
    Luminance(LuminanceArgs),
    /// Pixel intensity for a target luminance (grid search).
    Pixel(PixelArgs),
    /// Symmetric pixel pair for a target contrast (grid search).
    Contrast(ContrastArgs),
    /// Full-screen grey swatch stepper for light-meter readings.
    Measure(MeasureArgs),
    /// Write a synthetic measurement table from known coefficients.
    Synth(SynthArgs),
}

/// Options for `lum fit`.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Measurement CSV (rows = repetitions, columns = pixel intensities).
    #[arg(short = 'f', long = "input", env = "LUMFIT_INPUT", value_name = "CSV")]
    pub input: Option<PathBuf>,

    /// Directory for `plot_<index>.png` charts.
    #[arg(short = 'o', long, env = "LUMFIT_OUTPUT_DIR", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// TOML run configuration (labels, limits, ranges).
    #[arg(long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Pixel-intensity range covered by the table columns.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, value_name = "MIN,MAX")]
    pub x_range: Option<Vec<f64>>,

    /// Expected number of columns per row (17 unless the config file says otherwise).
    #[arg(long)]
    pub samples: Option<usize>,

    /// Chart title.
    #[arg(long)]
    pub title: Option<String>,

    /// Which model(s) to fit.
    #[arg(long, value_enum, default_value_t = ModelSpec::All)]
    pub model: ModelSpec,

    /// Abort on the first model that fails instead of skipping it.
    #[arg(long)]
    pub strict: bool,

    /// Objective evaluation budget per model (default 200·(p+1)).
    #[arg(long)]
    pub max_evals: Option<usize>,

    /// Do not write chart PNGs.
    #[arg(long)]
    pub no_plot: bool,

    /// Export fitted models to JSON (readable by the lookup commands).
    #[arg(long = "export-fit", value_name = "JSON")]
    pub export_fit: Option<PathBuf>,

    /// Export the reduced curve (x, mean, std) to CSV.
    #[arg(long = "export-reduced", value_name = "CSV")]
    pub export_reduced: Option<PathBuf>,
}

/// Where a lookup command gets its model from.
#[derive(Debug, Args, Clone)]
pub struct ModelSourceArgs {
    /// Model coefficients in order A,B,C,...
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        value_name = "A,B,..",
        required_unless_present = "fit",
        conflicts_with = "fit"
    )]
    pub coeffs: Option<Vec<f64>>,

    /// Fit JSON written by `lum fit --export-fit`.
    #[arg(long, value_name = "JSON")]
    pub fit: Option<PathBuf>,

    /// Model form the coefficients belong to.
    #[arg(long, value_enum, default_value_t = ModelKind::Cubic)]
    pub model: ModelKind,
}

#[derive(Debug, Args, Clone)]
pub struct LuminanceArgs {
    #[command(flatten)]
    pub source: ModelSourceArgs,

    /// Pixel intensity in [-1, 1].
    #[arg(long, allow_hyphen_values = true)]
    pub pixel: f64,
}

#[derive(Debug, Args, Clone)]
pub struct PixelArgs {
    #[command(flatten)]
    pub source: ModelSourceArgs,

    /// Target luminance (cd/m^2).
    #[arg(long, allow_hyphen_values = true)]
    pub luminance: f64,

    /// Search grid resolution over [-1, 1].
    #[arg(long, default_value_t = DEFAULT_GRID_POINTS)]
    pub grid_points: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ContrastArgs {
    #[command(flatten)]
    pub source: ModelSourceArgs,

    /// Target contrast between the pixel pair.
    #[arg(long, allow_hyphen_values = true)]
    pub target: f64,

    /// Search grid resolution over [0, 1].
    #[arg(long, default_value_t = DEFAULT_GRID_POINTS)]
    pub grid_points: usize,
}

#[derive(Debug, Args, Clone)]
pub struct MeasureArgs {
    /// Number of intensity steps from black to white.
    #[arg(long, default_value_t = DEFAULT_STEPS)]
    pub steps: usize,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Output CSV path.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub output: PathBuf,

    /// Model form to sample.
    #[arg(long, value_enum, default_value_t = ModelKind::Cubic)]
    pub model: ModelKind,

    /// Model coefficients in order A,B,C,...
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_values_t = [-195.9, 246.3, 887.4, 454.4]
    )]
    pub coeffs: Vec<f64>,

    /// Columns per row.
    #[arg(long, default_value_t = 17)]
    pub samples: usize,

    /// Number of repetition rows.
    #[arg(long, default_value_t = 3)]
    pub repetitions: usize,

    /// Standard deviation of the additive Gaussian noise (cd/m^2).
    #[arg(long, default_value_t = 5.0)]
    pub noise: f64,

    /// RNG seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Pixel-intensity range covered by the columns.
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        value_name = "MIN,MAX",
        default_values_t = [-1.0, 1.0]
    )]
    pub x_range: Vec<f64>,
}
