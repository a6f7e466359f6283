use crate::error::{DiffCoexError, Result};
use ndarray::{Array2, Axis, concatenate};

/// Standardize every column to zero mean and unit sample standard deviation.
///
/// The standard deviation uses the n - 1 denominator. Columns with zero deviation, or
/// matrices with fewer than two rows, are only centered.
pub fn scale_columns(matrix: &Array2<f64>) -> Array2<f64> {
    let n_rows = matrix.nrows();
    let mut scaled = matrix.to_owned();
    if n_rows == 0 {
        return scaled;
    }

    let n = n_rows as f64;
    for mut column in scaled.axis_iter_mut(Axis(1)) {
        let mean = column.iter().sum::<f64>() / n;
        let std_dev = if n_rows > 1 {
            let sum_sq: f64 = column.iter().map(|&v| (v - mean) * (v - mean)).sum();
            (sum_sq / (n - 1.0)).sqrt()
        } else {
            0.0
        };

        if std_dev != 0.0 {
            column.mapv_inplace(|v| (v - mean) / std_dev);
        } else {
            column.mapv_inplace(|v| v - mean);
        }
    }
    scaled
}

/// Stack the rows of `condition_a` above the rows of `condition_b` and scale the result.
///
/// Fails with [`DiffCoexError::DimensionMismatch`] when the column counts differ.
pub fn combine(condition_a: &Array2<f64>, condition_b: &Array2<f64>) -> Result<Array2<f64>> {
    if condition_a.ncols() != condition_b.ncols() {
        return Err(DiffCoexError::dimension(
            "combine (column count)",
            condition_a.ncols(),
            condition_b.ncols(),
        ));
    }

    let pooled = concatenate(Axis(0), &[condition_a.view(), condition_b.view()]).map_err(|e| {
        DiffCoexError::InvalidInput {
            reason: format!("cannot stack condition matrices: {}", e),
        }
    })?;
    Ok(scale_columns(&pooled))
}
