//! Column reductions over repeated measurements.

/// Mean and population standard deviation (divisor `n`).
///
/// Returns `(NaN, NaN)` for an empty slice.
pub fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Regroup equally sized rows into `width` columns.
///
/// Rows shorter than `width` simply contribute nothing to the missing columns;
/// callers validate lengths beforehand.
pub fn transpose_columns(rows: &[Vec<f64>], width: usize) -> Vec<Vec<f64>> {
    let mut cols = vec![Vec::with_capacity(rows.len()); width];
    for row in rows {
        for (col, &v) in cols.iter_mut().zip(row.iter()) {
            col.push(v);
        }
    }
    cols
}
