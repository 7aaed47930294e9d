//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - initialises logging
//! - resolves the run configuration (defaults < TOML < env < flags)
//! - dispatches to fitting, lookup, measurement or synthesis

use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{
    Cli, Command, ContrastArgs, FitArgs, LuminanceArgs, ModelSourceArgs, PixelArgs, SynthArgs,
};
use crate::domain::{FittedModel, InversionTarget, RunConfig};
use crate::error::AppError;
use crate::fit::{BatchOptions, FailurePolicy, FitOptions, GridSpec, invert};
use crate::io::{FitReport, SynthSpec};
use crate::report::{format_inversion, format_luminance_line, format_run_summary};

pub mod pipeline;

/// Entry point for the `lum` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` must be loaded before clap reads `LUMFIT_*` variables.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Luminance(args) => handle_luminance(args),
        Command::Pixel(args) => handle_pixel(args),
        Command::Contrast(args) => handle_contrast(args),
        Command::Measure(args) => crate::tui::run_measure(args.steps),
        Command::Synth(args) => handle_synth(args),
    }
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = resolve_run_config(&args)?;
    let opts = batch_options(&args);
    let kinds = args.model.kinds();

    let (run, charts) = if args.no_plot {
        (pipeline::run_fit(&config, &kinds, &opts)?, Vec::new())
    } else {
        pipeline::run_fit_with_charts(&config, &kinds, &opts)?
    };

    println!(
        "{}",
        format_run_summary(&config.input_path, &run.curve.stats(), &run.batch)
    );
    for path in &charts {
        println!("Chart: {}", path.display());
    }

    // Optional exports.
    if let Some(path) = &args.export_fit {
        let report = FitReport::new(&config.input_path, &run.batch.fits);
        crate::io::write_fit_json(path, &report)?;
    }
    if let Some(path) = &args.export_reduced {
        crate::io::write_reduced_csv(path, &run.curve)?;
    }

    Ok(())
}

fn handle_luminance(args: LuminanceArgs) -> Result<(), AppError> {
    let model = model_from_source(&args.source)?;
    if !args.pixel.is_finite() {
        return Err(AppError::InvalidConfig(format!(
            "pixel intensity must be finite (got {})",
            args.pixel
        )));
    }
    let luminance = model.predict(args.pixel);
    if !luminance.is_finite() {
        return Err(AppError::Domain {
            kind: model.kind,
            reason: format!("model is not finite at x = {}", args.pixel),
        });
    }
    println!("{}", format_luminance_line(args.pixel, luminance));
    Ok(())
}

fn handle_pixel(args: PixelArgs) -> Result<(), AppError> {
    let model = model_from_source(&args.source)?;
    let grid = GridSpec::pixel_range().with_count(args.grid_points)?;
    let answer = invert(&model, InversionTarget::Luminance(args.luminance), &grid)?;
    println!("{}", format_inversion(args.luminance, &answer, grid.step()));
    Ok(())
}

fn handle_contrast(args: ContrastArgs) -> Result<(), AppError> {
    let model = model_from_source(&args.source)?;
    let grid = GridSpec::contrast_range().with_count(args.grid_points)?;
    let answer = invert(&model, InversionTarget::Contrast(args.target), &grid)?;
    println!("{}", format_inversion(args.target, &answer, grid.step()));
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let spec = SynthSpec {
        model: FittedModel::new(args.model, args.coeffs.clone()),
        samples: args.samples,
        repetitions: args.repetitions,
        noise_sd: args.noise,
        seed: args.seed,
        x_range: pair("x-range", &args.x_range)?,
    };
    crate::io::write_synthetic_csv(&args.output, &spec)?;
    println!("Wrote {}", args.output.display());
    Ok(())
}

/// Merge config sources, lowest to highest precedence: built-in defaults,
/// `--config` TOML, then flags (clap has already folded `LUMFIT_*` env vars
/// into the flag values, below explicit flags).
pub fn resolve_run_config(args: &FitArgs) -> Result<RunConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };

    if let Some(input) = &args.input {
        config.input_path = input.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(range) = &args.x_range {
        config.x_range = pair("x-range", range)?;
    }
    if let Some(samples) = args.samples {
        config.samples = samples;
    }
    if let Some(title) = &args.title {
        config.title = title.clone();
    }

    config.validate()?;
    Ok(config)
}

fn batch_options(args: &FitArgs) -> BatchOptions {
    BatchOptions {
        fit: FitOptions {
            max_iterations: args.max_evals,
            ..FitOptions::default()
        },
        policy: if args.strict {
            FailurePolicy::AbortOnFirst
        } else {
            FailurePolicy::SkipAndContinue
        },
    }
}

/// Build the model a lookup command should use, from `--coeffs` or `--fit`.
pub fn model_from_source(source: &ModelSourceArgs) -> Result<FittedModel, AppError> {
    match (&source.coeffs, &source.fit) {
        (Some(coeffs), _) => {
            let model = FittedModel::new(source.model, coeffs.clone());
            model.validate().map_err(AppError::InvalidConfig)?;
            Ok(model)
        }
        (None, Some(path)) => crate::io::read_fit_json(path)?.model(source.model),
        (None, None) => Err(AppError::InvalidConfig(
            "either --coeffs or --fit is required".to_string(),
        )),
    }
}

fn pair(name: &str, values: &[f64]) -> Result<[f64; 2], AppError> {
    match values {
        [lo, hi] => Ok([*lo, *hi]),
        _ => Err(AppError::InvalidConfig(format!(
            "{name} takes exactly two values MIN,MAX (got {})",
            values.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempdir::TempDir;

    fn fit_args(argv: &[&str]) -> FitArgs {
        let mut full = vec!["lum", "fit"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Fit(args) => args,
            other => panic!("expected fit, got {other:?}"),
        }
    }

    #[test]
    fn flags_override_toml() {
        let dir = TempDir::new("lumfit-app").unwrap();
        let toml_path = dir.path().join("run.toml");
        std::fs::write(
            &toml_path,
            "title = \"from toml\"\nx_range = [0.0, 1.0]\ny_limits = [0.0, 1500.0]\n",
        )
        .unwrap();

        let args = fit_args(&[
            "--config",
            toml_path.to_str().unwrap(),
            "--input",
            "lab.csv",
            "--x-range=-1,1",
        ]);
        let config = resolve_run_config(&args).unwrap();
        assert_eq!(config.title, "from toml");
        assert_eq!(config.y_limits, [0.0, 1500.0]);
        assert_eq!(config.x_range, [-1.0, 1.0]);
        assert_eq!(config.input_path, PathBuf::from("lab.csv"));
    }

    #[test]
    fn x_range_needs_two_values() {
        let args = fit_args(&["--x-range", "0,0.5,1"]);
        assert!(matches!(
            resolve_run_config(&args),
            Err(AppError::InvalidConfig(_))
        ));
    }

    #[test]
    fn strict_selects_abort_policy() {
        assert_eq!(batch_options(&fit_args(&["--strict"])).policy, FailurePolicy::AbortOnFirst);
        assert_eq!(batch_options(&fit_args(&[])).policy, FailurePolicy::SkipAndContinue);
    }

    #[test]
    fn coefficient_count_is_checked() {
        let source = ModelSourceArgs {
            coeffs: Some(vec![1.0, 2.0]),
            fit: None,
            model: crate::domain::ModelKind::Cubic,
        };
        assert!(matches!(model_from_source(&source), Err(AppError::InvalidConfig(_))));
    }
}
