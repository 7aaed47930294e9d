//! Numeric inversion of a fitted model by dense grid search.
//!
//! The models are cheap to evaluate and the domains are tiny (`[-1, 1]` for
//! pixel lookups, `[0, 1]` for contrast pairs), so a uniform grid is scanned
//! exhaustively. The answer is the first grid point minimising the absolute
//! error, which makes ties resolve to the lowest `x`. The quantisation bound
//! is the grid step, reported alongside every answer. Points are generated
//! on the fly, so the resolution only costs time.

use crate::domain::{FittedModel, Inversion, InversionTarget};
use crate::error::AppError;

/// Grid resolution used by the lookup commands.
pub const DEFAULT_GRID_POINTS: usize = 10_000;

/// Upper bound on the grid resolution.
pub const MAX_GRID_POINTS: usize = 100_000_000;

/// Uniform search grid over `[start, end]`, both ends included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl GridSpec {
    pub fn new(start: f64, end: f64, count: usize) -> Result<Self, AppError> {
        if !(start.is_finite() && end.is_finite() && end > start) {
            return Err(AppError::InvalidConfig(format!(
                "search grid needs finite bounds with end > start (got [{start}, {end}])"
            )));
        }
        if !(2..=MAX_GRID_POINTS).contains(&count) {
            return Err(AppError::InvalidConfig(format!(
                "search grid needs between 2 and {MAX_GRID_POINTS} points (got {count})"
            )));
        }
        Ok(Self { start, end, count })
    }

    /// Pixel-intensity domain `[-1, 1]`.
    pub fn pixel_range() -> Self {
        Self {
            start: -1.0,
            end: 1.0,
            count: DEFAULT_GRID_POINTS,
        }
    }

    /// One-sided contrast domain `[0, 1]`.
    pub fn contrast_range() -> Self {
        Self {
            start: 0.0,
            end: 1.0,
            count: DEFAULT_GRID_POINTS,
        }
    }

    pub fn with_count(self, count: usize) -> Result<Self, AppError> {
        Self::new(self.start, self.end, count)
    }

    /// Spacing between neighbouring grid points.
    pub fn step(&self) -> f64 {
        (self.end - self.start) / (self.count - 1) as f64
    }

    /// Grid points in ascending order, matching `math::linspace`.
    pub fn points(&self) -> impl Iterator<Item = f64> {
        let Self { start, end, count } = *self;
        let step = self.step();
        (0..count).map(move |i| if i + 1 == count { end } else { start + step * i as f64 })
    }
}

/// Contrast between the symmetric pixel pair `(-x, x)`.
pub fn contrast(model: &FittedModel, x: f64) -> f64 {
    let hi = model.predict(x);
    let lo = model.predict(-x);
    (hi - lo) / (hi + lo)
}

/// First grid point minimising `|objective(x) - target|`; non-finite
/// evaluations are skipped.
fn first_minimiser(
    points: impl Iterator<Item = f64>,
    target: f64,
    objective: impl Fn(f64) -> f64,
) -> Option<(f64, f64)> {
    let mut best: Option<(f64, f64, f64)> = None;
    for x in points {
        let value = objective(x);
        if !value.is_finite() {
            continue;
        }
        let err = (value - target).abs();
        match best {
            Some((_, _, best_err)) if err >= best_err => {}
            _ => best = Some((x, value, err)),
        }
    }
    best.map(|(x, value, _)| (x, value))
}

fn check_target(target: f64) -> Result<(), AppError> {
    if !target.is_finite() {
        return Err(AppError::InvalidConfig(format!(
            "inversion target must be finite (got {target})"
        )));
    }
    Ok(())
}

/// Pixel intensity whose predicted luminance is closest to `target`.
pub fn invert_value(
    model: &FittedModel,
    target: f64,
    grid: &GridSpec,
) -> Result<Inversion, AppError> {
    check_target(target)?;
    let (x, value) = first_minimiser(grid.points(), target, |x| model.predict(x)).ok_or_else(
        || AppError::Domain {
            kind: model.kind,
            reason: format!(
                "model is not finite anywhere on [{}, {}]",
                grid.start, grid.end
            ),
        },
    )?;
    Ok(Inversion::Pixel { x, value })
}

/// Symmetric pixel pair `(-x, x)` whose contrast is closest to `target`.
///
/// The grid is the one-sided domain, so it must not extend below zero.
pub fn invert_contrast(
    model: &FittedModel,
    target: f64,
    grid: &GridSpec,
) -> Result<Inversion, AppError> {
    check_target(target)?;
    if grid.start < 0.0 {
        return Err(AppError::InvalidConfig(format!(
            "contrast grid must start at or above 0 (got {})",
            grid.start
        )));
    }
    let (x, value) = first_minimiser(grid.points(), target, |x| contrast(model, x)).ok_or_else(
        || AppError::Domain {
            kind: model.kind,
            reason: format!(
                "contrast is not finite anywhere on [{}, {}]",
                grid.start, grid.end
            ),
        },
    )?;
    Ok(Inversion::Pair {
        low: -x,
        high: x,
        contrast: value,
    })
}

pub fn invert(
    model: &FittedModel,
    target: InversionTarget,
    grid: &GridSpec,
) -> Result<Inversion, AppError> {
    match target {
        InversionTarget::Luminance(value) => invert_value(model, value, grid),
        InversionTarget::Contrast(value) => invert_contrast(model, value, grid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;
    use crate::math::linspace;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn reference_cubic() -> FittedModel {
        FittedModel::new(ModelKind::Cubic, vec![-195.9, 246.3, 887.4, 454.4])
    }

    fn contrast_cubic() -> FittedModel {
        FittedModel::new(ModelKind::Cubic, vec![-190.2, 227.0, 839.3, 431.3])
    }

    #[test]
    fn value_inversion_recovers_grid_point() {
        let model = reference_cubic();
        let grid = GridSpec::pixel_range();
        let points: Vec<f64> = grid.points().collect();
        let x0 = points[7000];
        let target = model.predict(x0);

        let Inversion::Pixel { x, value } = invert_value(&model, target, &grid).unwrap() else {
            panic!("expected a single pixel");
        };
        assert_eq!(x, x0);
        assert_eq!(value, target);
    }

    #[test]
    fn ties_resolve_to_lowest_x() {
        // f(x) = x² on [-1, -0.5, 0, 0.5, 1]: both ±0.5 hit 0.25 exactly.
        let model = FittedModel::new(ModelKind::Cubic, vec![0.0, 1.0, 0.0, 0.0]);
        let grid = GridSpec::new(-1.0, 1.0, 5).unwrap();
        let out = invert_value(&model, 0.25, &grid).unwrap();
        assert_eq!(out, Inversion::Pixel { x: -0.5, value: 0.25 });
    }

    #[test]
    fn out_of_range_target_clamps_to_domain_edge() {
        let model = reference_cubic();
        let grid = GridSpec::pixel_range();
        let Inversion::Pixel { x, .. } = invert_value(&model, 1e6, &grid).unwrap() else {
            panic!("expected a single pixel");
        };
        assert_eq!(x, 1.0);
    }

    #[test]
    fn contrast_inversion_small_target() {
        let model = contrast_cubic();
        let out = invert_contrast(&model, 0.05, &GridSpec::contrast_range()).unwrap();
        let Inversion::Pair { low, high, contrast } = out else {
            panic!("expected a pixel pair");
        };
        assert_abs_diff_eq!(high, 0.0257, epsilon = 5e-4);
        assert_eq!(low, -high);
        assert_abs_diff_eq!(contrast, 0.05, epsilon = 1e-3);
    }

    #[test]
    fn contrast_inversion_large_target() {
        let model = contrast_cubic();
        let out = invert(
            &model,
            InversionTarget::Contrast(0.43),
            &GridSpec::contrast_range(),
        )
        .unwrap();
        let Inversion::Pair { high, .. } = out else {
            panic!("expected a pixel pair");
        };
        assert!((contrast(&model, high) - 0.43).abs() < 0.05);
    }

    #[test]
    fn contrast_grid_must_be_one_sided() {
        let grid = GridSpec::new(-1.0, 1.0, 11).unwrap();
        let err = invert_contrast(&contrast_cubic(), 0.1, &grid).unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }

    #[test]
    fn nowhere_finite_model_is_a_domain_error() {
        // ln(x) over [-1, -0.1] is NaN everywhere.
        let model = FittedModel::new(ModelKind::Logarithmic, vec![1.0, 0.0]);
        let grid = GridSpec::new(-1.0, -0.1, 10).unwrap();
        let err = invert_value(&model, 0.0, &grid).unwrap_err();
        assert!(matches!(err, AppError::Domain { .. }));
    }

    #[test]
    fn grid_step_and_bounds() {
        let grid = GridSpec::new(0.0, 1.0, 11).unwrap();
        assert_abs_diff_eq!(grid.step(), 0.1, epsilon = 1e-15);
        let points: Vec<f64> = grid.points().collect();
        assert_eq!(points, linspace(0.0, 1.0, 11));
        assert!(GridSpec::new(0.0, 1.0, 1).is_err());
        assert!(GridSpec::new(1.0, 0.0, 10).is_err());
    }

    #[test]
    fn huge_grid_is_rejected_up_front() {
        let err = GridSpec::pixel_range().with_count(1_000_000_000_000).unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
        assert!(err.to_string().contains("100000000"), "{err}");

        let finest = GridSpec::pixel_range().with_count(MAX_GRID_POINTS).unwrap();
        assert_eq!(finest.points().size_hint(), (MAX_GRID_POINTS, Some(MAX_GRID_POINTS)));
    }

    proptest! {
        #[test]
        fn contrast_is_antisymmetric(x in 0.0f64..1.0) {
            let model = contrast_cubic();
            prop_assert_eq!(contrast(&model, -x), -contrast(&model, x));
        }

        #[test]
        fn value_inversion_stays_in_domain(target in -500.0f64..2000.0) {
            let model = reference_cubic();
            let grid = GridSpec::new(-1.0, 1.0, 501).unwrap();
            let Inversion::Pixel { x, value } = invert_value(&model, target, &grid).unwrap() else {
                panic!("expected a single pixel");
            };
            prop_assert!((-1.0..=1.0).contains(&x));
            // No grid point does strictly better.
            for p in grid.points() {
                prop_assert!((value - target).abs() <= (model.predict(p) - target).abs());
            }
        }
    }
}
