//! Model evaluation for the five luminance curve forms.
//!
//! The fitter relies on three primitive operations:
//! - predict `y(x)` given parameters (residuals, charts, inversion)
//! - fill the parameter gradient `∂y/∂p` at `x` (Jacobian rows)
//! - a default starting point for the solver
//!
//! All functions follow plain IEEE-754 semantics: evaluating outside a model's
//! domain (e.g. `ln(x)` for `x <= 0`) yields NaN rather than an error.

use crate::domain::{FittedModel, ModelKind};

/// Predict `y(x)` for the given model kind.
///
/// `params` must have length `kind.param_count()`.
pub fn predict(kind: ModelKind, x: f64, params: &[f64]) -> f64 {
    match kind {
        ModelKind::Exponential => params[0] * (params[1] * x).exp() + params[2],
        ModelKind::Logarithmic => params[0] * x.ln() + params[1],
        ModelKind::Quadratic => params[0] * x * x + params[1] * x + params[2],
        ModelKind::Cubic => {
            params[0] * x.powi(3) + params[1] * x.powi(2) + params[2] * x + params[3]
        }
        ModelKind::PowerLaw => params[0] * (x + params[1]).powf(params[2]) + params[3],
    }
}

/// Fill `out` with the partial derivatives of `y(x)` w.r.t. each parameter.
///
/// # Panics
/// Panics if `out` or `params` is shorter than `kind.param_count()`.
pub fn fill_gradient(kind: ModelKind, x: f64, params: &[f64], out: &mut [f64]) {
    match kind {
        ModelKind::Exponential => {
            let e = (params[1] * x).exp();
            out[0] = e;
            out[1] = params[0] * x * e;
            out[2] = 1.0;
        }
        ModelKind::Logarithmic => {
            out[0] = x.ln();
            out[1] = 1.0;
        }
        ModelKind::Quadratic => {
            out[0] = x * x;
            out[1] = x;
            out[2] = 1.0;
        }
        ModelKind::Cubic => {
            out[0] = x.powi(3);
            out[1] = x.powi(2);
            out[2] = x;
            out[3] = 1.0;
        }
        ModelKind::PowerLaw => {
            let (a, b, c) = (params[0], params[1], params[2]);
            let base = x + b;
            let p = base.powf(c);
            out[0] = p;
            out[1] = a * c * base.powf(c - 1.0);
            // base^C·ln(base) → 0 as base → 0⁺.
            out[2] = if p == 0.0 { 0.0 } else { a * p * base.ln() };
            out[3] = 1.0;
        }
    }
}

/// Default solver starting point.
///
/// All ones, except the power law: at `C = 1` its `B` and `D` columns coincide
/// (`∂y/∂B = A·C·(x+B)^(C-1) = 1 = ∂y/∂D`), so it starts from `C = 2`, `D = 0`.
pub fn initial_guess(kind: ModelKind) -> Vec<f64> {
    match kind {
        ModelKind::PowerLaw => vec![1.0, 1.0, 2.0, 0.0],
        _ => vec![1.0; kind.param_count()],
    }
}

/// Decimal places used when rendering each coefficient in the equation string.
pub fn equation_decimals(kind: ModelKind) -> &'static [usize] {
    match kind {
        ModelKind::Exponential => &[0, 2, 0],
        ModelKind::Logarithmic => &[0, 0],
        ModelKind::Quadratic => &[2, 2, 2],
        ModelKind::Cubic => &[1, 1, 1, 1],
        ModelKind::PowerLaw => &[1, 1, 1, 1],
    }
}

impl FittedModel {
    pub fn new(kind: ModelKind, params: Vec<f64>) -> Self {
        Self { kind, params }
    }

    pub fn predict(&self, x: f64) -> f64 {
        predict(self.kind, x, &self.params)
    }

    /// Check the parameter vector length against the model kind.
    pub fn validate(&self) -> Result<(), String> {
        let expected = self.kind.param_count();
        if self.params.len() != expected {
            return Err(format!(
                "{} model takes {expected} coefficients, got {}",
                self.kind.display_name(),
                self.params.len()
            ));
        }
        if self.params.iter().any(|p| !p.is_finite()) {
            return Err("coefficients must be finite".to_string());
        }
        Ok(())
    }
}
