//! Fit several model kinds against the same reduced curve.
//!
//! Each model is fitted independently (in parallel); results are reported in
//! the order the kinds were requested. What happens when one fit fails is a
//! policy choice:
//!
//! - `SkipAndContinue`: record the failure and keep the other fits
//! - `AbortOnFirst`: return the first failure in model order

use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::{FitResult, ModelKind, ReducedCurve};
use crate::error::AppError;
use crate::fit::fitter::{FitOptions, fit_model};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    SkipAndContinue,
    AbortOnFirst,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub fit: FitOptions,
    pub policy: FailurePolicy,
}

/// Output of a multi-model fit.
#[derive(Debug, Clone)]
pub struct FitBatch {
    /// Successful fits, in requested order.
    pub fits: Vec<FitResult>,
    /// Models that failed and why (only under `SkipAndContinue`).
    pub skipped: Vec<(ModelKind, String)>,
}

impl FitBatch {
    pub fn get(&self, kind: ModelKind) -> Option<&FitResult> {
        self.fits.iter().find(|f| f.kind() == kind)
    }
}

/// Fit every kind in `kinds` to the mean curve.
///
/// Fails if `kinds` is empty, if the policy is `AbortOnFirst` and any fit
/// fails, or if no fit succeeds at all (the first failure is returned).
pub fn fit_all(
    curve: &ReducedCurve,
    kinds: &[ModelKind],
    opts: &BatchOptions,
) -> Result<FitBatch, AppError> {
    if kinds.is_empty() {
        return Err(AppError::InvalidConfig("no models selected".to_string()));
    }

    let outcomes: Vec<(ModelKind, Result<FitResult, AppError>)> = kinds
        .par_iter()
        .map(|&kind| (kind, fit_model(kind, &curve.x, &curve.mean, &opts.fit)))
        .collect();

    let mut fits = Vec::with_capacity(kinds.len());
    let mut skipped = Vec::new();
    let mut first_err = None;

    for (kind, outcome) in outcomes {
        match outcome {
            Ok(fit) => {
                info!(
                    model = kind.display_name(),
                    sse = fit.sse,
                    iterations = fit.iterations,
                    "fitted"
                );
                fits.push(fit);
            }
            Err(err) if opts.policy == FailurePolicy::AbortOnFirst => return Err(err),
            Err(err) => {
                warn!(model = kind.display_name(), "skipping model: {err}");
                skipped.push((kind, err.to_string()));
                first_err.get_or_insert(err);
            }
        }
    }

    if fits.is_empty() {
        if let Some(err) = first_err {
            return Err(err);
        }
    }

    Ok(FitBatch { fits, skipped })
}
