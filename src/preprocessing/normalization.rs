use ndarray::{Array2, Axis};
use std::cmp::Ordering;

/// Element-wise log2. Non-positive values map to 0.0.
pub fn log2_transform(matrix: &Array2<f64>) -> Array2<f64> {
    matrix.mapv(|v| if v <= 0.0 { 0.0 } else { v.log2() })
}

/// Quantile normalization as used by the co-expression pipeline.
///
/// Each column is sorted ascending in place of its original order and then centered on its
/// own mean. Columns are not averaged against each other, so two columns end up with the same
/// values only when their sorted profiles differ by a constant shift.
pub fn quantile_normalize(matrix: &Array2<f64>) -> Array2<f64> {
    let mut normalized = matrix.to_owned();
    let n_rows = normalized.nrows();
    if n_rows == 0 {
        return normalized;
    }

    for mut column in normalized.axis_iter_mut(Axis(1)) {
        let mut sorted: Vec<f64> = column.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let mean = sorted.iter().sum::<f64>() / n_rows as f64;
        for (dst, value) in column.iter_mut().zip(sorted) {
            *dst = value - mean;
        }
    }
    normalized
}
