//! Evenly spaced sample grids.

/// `count` evenly spaced points from `start` to `end` (inclusive).
///
/// Points are computed as `start + i·step`, and the last point is pinned to
/// `end` so it never drifts outside the domain. `count == 1` yields `[start]`.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count as f64 - 1.0);
            let mut out: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
            out[count - 1] = end;
            out
        }
    }
}
