//! Run configuration.
//!
//! A `RunConfig` is assembled from (lowest to highest precedence) built-in
//! defaults, an optional TOML file, environment variables and CLI flags. The
//! fitting, I/O and chart code only ever see the resolved struct.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::linspace;

/// Columns in a standard lab table: 17 pixel intensities over [-1, 1].
pub const DEFAULT_SAMPLES: usize = 17;

/// Everything a `lum fit` run needs to know about its inputs and outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Measurement table (rows = repetitions, columns = pixel intensities).
    pub input_path: PathBuf,
    /// Directory receiving `plot_<index>.png` charts.
    pub output_dir: PathBuf,
    pub x_label: String,
    pub y_label: String,
    pub title: String,
    /// Chart x-axis limits.
    pub x_limits: [f64; 2],
    /// Chart y-axis limits.
    pub y_limits: [f64; 2],
    /// Pixel-intensity range the table columns are spread over (inclusive).
    pub x_range: [f64; 2],
    /// Expected number of columns; a table of any other width is rejected.
    pub samples: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("luminance.csv"),
            output_dir: PathBuf::from("."),
            x_label: "Pixel value [-1 to 1]".to_string(),
            y_label: "Luminance [cd/m^2]".to_string(),
            title: "Luminance as a function of pixel intensity".to_string(),
            x_limits: [-1.1, 1.1],
            y_limits: [-10.0, 300.0],
            x_range: [-1.0, 1.0],
            samples: DEFAULT_SAMPLES,
        }
    }
}

impl RunConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        toml::from_str(text).map_err(|e| AppError::InvalidConfig(format!("config TOML: {e}")))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path).map_err(|e| {
            AppError::InvalidConfig(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        check_range("x_range", self.x_range)?;
        check_range("x_limits", self.x_limits)?;
        check_range("y_limits", self.y_limits)?;
        if self.samples < 2 {
            return Err(AppError::InvalidConfig(format!(
                "samples must be >= 2 (got {})",
                self.samples
            )));
        }
        Ok(())
    }

    /// Pixel intensities for `n` table columns spread over `x_range`.
    pub fn x_grid(&self, n: usize) -> Vec<f64> {
        linspace(self.x_range[0], self.x_range[1], n)
    }

    /// Path of the chart written for the model at `index`.
    pub fn chart_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("plot_{index}.png"))
    }
}

fn check_range(name: &str, range: [f64; 2]) -> Result<(), AppError> {
    let [lo, hi] = range;
    if !(lo.is_finite() && hi.is_finite() && hi > lo) {
        return Err(AppError::InvalidConfig(format!(
            "{name} must be finite with max > min (got [{lo}, {hi}])"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_only_given_keys() {
        let cfg = RunConfig::from_toml_str(
            r#"
            title = "7T projector"
            y_limits = [0.0, 1500.0]
            samples = 21
            "#,
        )
        .unwrap();
        assert_eq!(cfg.title, "7T projector");
        assert_eq!(cfg.y_limits, [0.0, 1500.0]);
        assert_eq!(cfg.samples, 21);
        assert_eq!(cfg.x_range, [-1.0, 1.0]);
        assert_eq!(cfg.x_label, RunConfig::default().x_label);
    }

    #[test]
    fn default_expects_the_lab_grid() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.samples, DEFAULT_SAMPLES);
        assert_eq!(cfg.x_grid(cfg.samples), linspace(-1.0, 1.0, 17));
    }

    #[test]
    fn validate_rejects_single_sample() {
        let cfg = RunConfig {
            samples: 1,
            ..RunConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(AppError::InvalidConfig(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = RunConfig::from_toml_str("colour = \"red\"").unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let cfg = RunConfig {
            x_range: [1.0, -1.0],
            ..RunConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn chart_path_uses_model_index() {
        let cfg = RunConfig {
            output_dir: PathBuf::from("out"),
            ..RunConfig::default()
        };
        assert_eq!(cfg.chart_path(3), PathBuf::from("out").join("plot_3.png"));
    }
}
