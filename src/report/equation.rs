//! Human-readable model equations.

use crate::domain::ModelKind;
use crate::models::equation_decimals;

/// `+ v` or `- |v|` for an additive term.
fn additive(value: f64, decimals: usize) -> String {
    if value < 0.0 {
        format!("- {:.*}", decimals, value.abs())
    } else {
        format!("+ {:.*}", decimals, value)
    }
}

/// Render the fitted equation with the model's coefficient precision.
///
/// Returns `None` if `params` does not match the model's parameter count.
pub fn format_equation(kind: ModelKind, params: &[f64]) -> Option<String> {
    let decimals = equation_decimals(kind);
    if params.len() != decimals.len() {
        return None;
    }
    let d = decimals;
    let p = params;
    let text = match kind {
        ModelKind::Exponential => format!(
            "y = {:.*} * e^({:.*} * x) {}",
            d[0],
            p[0],
            d[1],
            p[1],
            additive(p[2], d[2])
        ),
        ModelKind::Logarithmic => {
            format!("y = {:.*} * ln(x) {}", d[0], p[0], additive(p[1], d[1]))
        }
        ModelKind::Quadratic => format!(
            "y = {:.*} * x^2 {} * x {}",
            d[0],
            p[0],
            additive(p[1], d[1]),
            additive(p[2], d[2])
        ),
        ModelKind::Cubic => format!(
            "y = {:.*} * x^3 {} * x^2 {} * x {}",
            d[0],
            p[0],
            additive(p[1], d[1]),
            additive(p[2], d[2]),
            additive(p[3], d[3])
        ),
        ModelKind::PowerLaw => format!(
            "y = {:.*} * (x {})^{:.*} {}",
            d[0],
            p[0],
            additive(p[1], d[1]),
            d[2],
            p[2],
            additive(p[3], d[3])
        ),
    };
    Some(text)
}

impl ModelKind {
    /// Equation string for these coefficients; `"<invalid coefficients>"` on a
    /// length mismatch.
    pub fn equation(self, params: &[f64]) -> String {
        format_equation(self, params).unwrap_or_else(|| "<invalid coefficients>".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_reference_equation() {
        assert_eq!(
            ModelKind::Cubic.equation(&[-195.9, 246.3, 887.4, 454.4]),
            "y = -195.9 * x^3 + 246.3 * x^2 + 887.4 * x + 454.4"
        );
    }

    #[test]
    fn exponential_rounds_per_coefficient() {
        assert_eq!(
            ModelKind::Exponential.equation(&[312.46, 1.2345, -4.6]),
            "y = 312 * e^(1.23 * x) - 5"
        );
    }

    #[test]
    fn logarithmic_and_quadratic() {
        assert_eq!(
            ModelKind::Logarithmic.equation(&[120.4, 35.6]),
            "y = 120 * ln(x) + 36"
        );
        assert_eq!(
            ModelKind::Quadratic.equation(&[1.5, -2.25, 0.3]),
            "y = 1.50 * x^2 - 2.25 * x + 0.30"
        );
    }

    #[test]
    fn power_law_shift_is_signed() {
        assert_eq!(
            ModelKind::PowerLaw.equation(&[2.0, -0.5, 1.5, 3.26]),
            "y = 2.0 * (x - 0.5)^1.5 + 3.3"
        );
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert!(format_equation(ModelKind::Cubic, &[1.0]).is_none());
        assert_eq!(ModelKind::Cubic.equation(&[1.0]), "<invalid coefficients>");
    }
}
