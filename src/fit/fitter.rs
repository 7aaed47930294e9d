//! Nonlinear least-squares fitting for a single model kind.
//!
//! Given:
//! - pixel intensities `x_i`
//! - mean luminances `y_i`
//! - a model kind and a starting parameter vector
//!
//! we minimise `Σ (f(x_i; p) - y_i)²` with a Levenberg–Marquardt iteration:
//!
//! - each step solves the damped linear problem `[J; √λ D] δ = [-r; 0]`
//!   (`D` = running maximum of the Jacobian column norms, as MINPACK does)
//! - a step is accepted only if it lowers the (finite) SSE; `λ` shrinks on
//!   success and grows on failure
//! - convergence follows MINPACK's tests (`ftol`, `xtol`, `gtol`) plus an
//!   exactly zero residual
//!
//! The run is deterministic: no randomness, fixed starting point.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::{FitResult, FittedModel, ModelKind};
use crate::error::AppError;
use crate::math::{numerical_rank, solve_least_squares};
use crate::models::{fill_gradient, initial_guess, predict};

/// MINPACK's default `ftol`/`xtol` (`√ε` for `f64`).
pub const DEFAULT_TOL: f64 = 1.49012e-8;

const LAMBDA_MIN: f64 = 1e-12;
const LAMBDA_MAX: f64 = 1e16;

/// Solver settings for one fit.
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Starting point; `None` uses the model default (see `models::initial_guess`).
    pub initial_guess: Option<Vec<f64>>,
    /// Objective evaluation budget; `None` means `200·(p+1)`.
    pub max_iterations: Option<usize>,
    /// Relative SSE reduction tolerance.
    pub ftol: f64,
    /// Relative step size tolerance.
    pub xtol: f64,
    /// Gradient ∞-norm tolerance.
    pub gtol: f64,
    /// Initial damping factor.
    pub initial_lambda: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            initial_guess: None,
            max_iterations: None,
            ftol: DEFAULT_TOL,
            xtol: DEFAULT_TOL,
            gtol: 0.0,
            initial_lambda: 1e-3,
        }
    }
}

impl FitOptions {
    pub fn budget(&self, kind: ModelKind) -> usize {
        self.max_iterations
            .unwrap_or(200 * (kind.param_count() + 1))
            .max(1)
    }
}

/// Fit `kind` to `(x, y)` by Levenberg–Marquardt.
pub fn fit_model(
    kind: ModelKind,
    x: &[f64],
    y: &[f64],
    opts: &FitOptions,
) -> Result<FitResult, AppError> {
    let p = kind.param_count();
    let m = x.len();

    if y.len() != m {
        return Err(AppError::InvalidConfig(format!(
            "x and y lengths differ ({m} vs {})",
            y.len()
        )));
    }
    if m < p {
        return Err(AppError::InsufficientData {
            kind,
            points: m,
            params: p,
        });
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(AppError::InvalidConfig(
            "observations must be finite".to_string(),
        ));
    }
    check_domain(kind, x)?;

    let mut params = match &opts.initial_guess {
        Some(guess) if guess.len() != p => {
            return Err(AppError::InvalidConfig(format!(
                "{} initial guess needs {p} values, got {}",
                kind.display_name(),
                guess.len()
            )));
        }
        Some(guess) => guess.clone(),
        None => initial_guess(kind),
    };

    let mut r = residuals(kind, x, y, &params);
    let mut sse = r.norm_squared();
    if !sse.is_finite() {
        return Err(AppError::not_converged(
            kind,
            "objective is not finite at the initial point",
        ));
    }

    let mut jac = jacobian(kind, x, &params);
    if numerical_rank(&jac) < p {
        return Err(AppError::not_converged(
            kind,
            "Jacobian is singular at the initial point",
        ));
    }

    let budget = opts.budget(kind);
    let mut evaluations = 1usize;
    let mut iterations = 0usize;
    let mut lambda = opts.initial_lambda.max(LAMBDA_MIN);
    let mut scale = column_norms(&jac, None);

    'outer: loop {
        if sse == 0.0 {
            break;
        }
        let grad = jac.transpose() * &r;
        if grad.amax() <= opts.gtol {
            break;
        }

        // Inner loop: raise λ until a step lowers the SSE.
        loop {
            if evaluations >= budget {
                return Err(AppError::not_converged(
                    kind,
                    format!("iteration budget of {budget} evaluations exhausted (sse={sse:.6e})"),
                ));
            }

            let Some(step) = damped_step(&jac, &r, &scale, lambda) else {
                return Err(AppError::not_converged(kind, "damped step could not be solved"));
            };

            let p_norm = DVector::from_column_slice(&params).norm();
            let step_small = step.norm() <= opts.xtol * (p_norm + opts.xtol);

            let trial: Vec<f64> = params.iter().zip(step.iter()).map(|(a, d)| a + d).collect();
            let r_trial = residuals(kind, x, y, &trial);
            let sse_trial = r_trial.norm_squared();
            evaluations += 1;

            if sse_trial.is_finite() && sse_trial < sse {
                let predicted = (&r + &jac * &step).norm_squared();
                let actual_rel = (sse - sse_trial) / sse;
                let predicted_rel = (sse - predicted) / sse;

                params = trial;
                r = r_trial;
                sse = sse_trial;
                iterations += 1;
                lambda = (lambda / 10.0).max(LAMBDA_MIN);

                debug!(
                    model = kind.display_name(),
                    iteration = iterations,
                    sse,
                    lambda,
                    "accepted LM step"
                );

                let converged =
                    actual_rel.abs() <= opts.ftol && predicted_rel.abs() <= opts.ftol;
                if step_small || converged {
                    break 'outer;
                }

                jac = jacobian(kind, x, &params);
                if jac.iter().any(|v| !v.is_finite()) {
                    return Err(AppError::not_converged(
                        kind,
                        "Jacobian became non-finite during the fit",
                    ));
                }
                scale = column_norms(&jac, Some(&scale));
                continue 'outer;
            }

            if step_small {
                // No further reduction is possible at this resolution.
                break 'outer;
            }
            lambda *= 10.0;
            if lambda > LAMBDA_MAX {
                return Err(AppError::not_converged(
                    kind,
                    format!("no step reduces the objective (sse={sse:.6e})"),
                ));
            }
        }
    }

    let jac = jacobian(kind, x, &params);
    let covariance = covariance(&jac, sse, m, p);
    let rmse = (sse / m as f64).sqrt();

    debug!(
        model = kind.display_name(),
        iterations,
        evaluations,
        sse,
        "fit converged"
    );

    Ok(FitResult {
        model: FittedModel::new(kind, params),
        covariance,
        sse,
        rmse,
        iterations,
    })
}

/// The logarithmic model is only defined for strictly positive x.
fn check_domain(kind: ModelKind, x: &[f64]) -> Result<(), AppError> {
    if kind != ModelKind::Logarithmic {
        return Ok(());
    }
    if let Some(bad) = x.iter().copied().find(|&v| v <= 0.0) {
        return Err(AppError::Domain {
            kind,
            reason: format!("ln(x) is undefined for x = {bad}; the grid must be strictly positive"),
        });
    }
    Ok(())
}

fn residuals(kind: ModelKind, x: &[f64], y: &[f64], params: &[f64]) -> DVector<f64> {
    DVector::from_iterator(
        x.len(),
        x.iter().zip(y.iter()).map(|(&xi, &yi)| predict(kind, xi, params) - yi),
    )
}

fn jacobian(kind: ModelKind, x: &[f64], params: &[f64]) -> DMatrix<f64> {
    let p = kind.param_count();
    let mut jac = DMatrix::<f64>::zeros(x.len(), p);
    let mut row = vec![0.0; p];
    for (i, &xi) in x.iter().enumerate() {
        fill_gradient(kind, xi, params, &mut row);
        for j in 0..p {
            jac[(i, j)] = row[j];
        }
    }
    jac
}

/// Column norms of `jac`, never decreasing relative to `prev`; zero columns map to 1.
fn column_norms(jac: &DMatrix<f64>, prev: Option<&[f64]>) -> Vec<f64> {
    (0..jac.ncols())
        .map(|j| {
            let n = jac.column(j).norm();
            let n = if n.is_finite() && n > 0.0 { n } else { 1.0 };
            match prev {
                Some(prev) => n.max(prev[j]),
                None => n,
            }
        })
        .collect()
}

fn damped_step(
    jac: &DMatrix<f64>,
    r: &DVector<f64>,
    scale: &[f64],
    lambda: f64,
) -> Option<DVector<f64>> {
    let (m, p) = jac.shape();
    let mut a = DMatrix::<f64>::zeros(m + p, p);
    let mut b = DVector::<f64>::zeros(m + p);

    a.rows_mut(0, m).copy_from(jac);
    for i in 0..m {
        b[i] = -r[i];
    }
    let sl = lambda.sqrt();
    for j in 0..p {
        a[(m + j, j)] = sl * scale[j];
    }

    solve_least_squares(&a, &b)
}

/// `(JᵀJ)⁻¹ · SSE/(m − p)`, or `+inf` everywhere when it cannot be estimated.
fn covariance(jac: &DMatrix<f64>, sse: f64, m: usize, p: usize) -> Vec<Vec<f64>> {
    let not_estimable = vec![vec![f64::INFINITY; p]; p];
    if m <= p {
        return not_estimable;
    }
    let jtj = jac.transpose() * jac;
    let Some(inv) = jtj.try_inverse() else {
        return not_estimable;
    };
    let s2 = sse / (m - p) as f64;
    if inv.iter().any(|v| !v.is_finite()) {
        return not_estimable;
    }
    (0..p)
        .map(|i| (0..p).map(|j| inv[(i, j)] * s2).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::linspace;
    use approx::assert_relative_eq;

    fn synth(kind: ModelKind, params: &[f64], x: &[f64]) -> Vec<f64> {
        x.iter().map(|&xi| predict(kind, xi, params)).collect()
    }

    fn assert_recovers(kind: ModelKind, truth: &[f64], x: &[f64]) {
        let y = synth(kind, truth, x);
        let fit = fit_model(kind, x, &y, &FitOptions::default()).unwrap();
        for (got, want) in fit.params().iter().zip(truth) {
            assert_relative_eq!(*got, *want, max_relative = 1e-6, epsilon = 1e-9);
        }
        assert!(fit.sse < 1e-12, "{kind:?} sse={}", fit.sse);
    }

    #[test]
    fn recovers_exponential() {
        assert_recovers(ModelKind::Exponential, &[2.0, 1.5, 0.5], &linspace(0.0, 2.0, 21));
    }

    #[test]
    fn recovers_logarithmic() {
        assert_recovers(ModelKind::Logarithmic, &[120.0, 35.0], &linspace(0.1, 1.0, 17));
    }

    #[test]
    fn recovers_quadratic() {
        assert_recovers(ModelKind::Quadratic, &[300.0, 650.0, 420.0], &linspace(-1.0, 1.0, 17));
    }

    #[test]
    fn recovers_cubic() {
        assert_recovers(
            ModelKind::Cubic,
            &[-195.9, 246.3, 887.4, 454.4],
            &linspace(-1.0, 1.0, 17),
        );
    }

    #[test]
    fn recovers_power_law() {
        assert_recovers(ModelKind::PowerLaw, &[2.0, 0.5, 1.5, 1.0], &linspace(0.0, 4.0, 25));
    }

    #[test]
    fn singular_initial_jacobian_is_reported() {
        // All x = 0 makes the exponential's B column vanish.
        let x = [0.0; 6];
        let y = [3.0; 6];
        let err = fit_model(ModelKind::Exponential, &x, &y, &FitOptions::default()).unwrap_err();
        assert!(matches!(err, AppError::FitDidNotConverge { .. }), "{err}");
        assert!(err.to_string().contains("singular"));
    }

    #[test]
    fn all_ones_power_law_start_is_singular() {
        let x = linspace(0.0, 1.0, 10);
        let y = synth(ModelKind::PowerLaw, &[2.0, 0.5, 1.5, 1.0], &x);
        let opts = FitOptions {
            initial_guess: Some(vec![1.0; 4]),
            ..FitOptions::default()
        };
        let err = fit_model(ModelKind::PowerLaw, &x, &y, &opts).unwrap_err();
        assert!(matches!(err, AppError::FitDidNotConverge { .. }), "{err}");
    }

    #[test]
    fn exhausted_budget_is_reported() {
        let x = linspace(0.0, 2.0, 21);
        let y = synth(ModelKind::Exponential, &[2.0, 1.5, 0.5], &x);
        let opts = FitOptions {
            max_iterations: Some(1),
            ..FitOptions::default()
        };
        let err = fit_model(ModelKind::Exponential, &x, &y, &opts).unwrap_err();
        assert!(matches!(err, AppError::FitDidNotConverge { .. }), "{err}");
        assert!(err.to_string().contains("budget"));
    }

    #[test]
    fn log_model_rejects_non_positive_grid() {
        let x = linspace(-1.0, 1.0, 17);
        let y = vec![1.0; 17];
        let err = fit_model(ModelKind::Logarithmic, &x, &y, &FitOptions::default()).unwrap_err();
        assert!(matches!(err, AppError::Domain { .. }), "{err}");
    }

    #[test]
    fn too_few_points() {
        let err = fit_model(
            ModelKind::Cubic,
            &[0.0, 1.0, 2.0],
            &[1.0, 2.0, 3.0],
            &FitOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InsufficientData { points: 3, params: 4, .. }));
    }

    #[test]
    fn covariance_is_infinite_when_exactly_determined() {
        let x = [0.0, 1.0, 2.0];
        let y = [1.0, 2.0, 5.0];
        let fit = fit_model(ModelKind::Quadratic, &x, &y, &FitOptions::default()).unwrap();
        assert!(fit.covariance.iter().flatten().all(|v| v.is_infinite()));
        assert_relative_eq!(fit.params()[0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(fit.params()[1], 0.0, epsilon = 1e-8);
        assert_relative_eq!(fit.params()[2], 1.0, epsilon = 1e-8);
    }

    #[test]
    fn covariance_is_finite_for_noisy_overdetermined_fit() {
        let x = linspace(-1.0, 1.0, 9);
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &xi)| 2.0 * xi + 1.0 + if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect();
        let fit = fit_model(ModelKind::Quadratic, &x, &y, &FitOptions::default()).unwrap();
        assert!(fit.covariance.iter().flatten().all(|v| v.is_finite()));
        assert!(fit.std_errors().iter().all(|s| *s > 0.0));
    }

    #[test]
    fn default_starts_are_non_singular() {
        let x = linspace(0.1, 1.0, 17);
        for kind in ModelKind::ALL {
            let jac = jacobian(kind, &x, &initial_guess(kind));
            assert_eq!(numerical_rank(&jac), kind.param_count(), "{kind:?}");
        }
    }
}
