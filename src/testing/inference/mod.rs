//! Two-sample location test with a normal approximation.
//!
//! Used by the module-level co-expression check, which compares two collections of
//! correlation coefficients. The statistic has the Welch form but the p-value is taken from
//! the standard normal distribution rather than a t distribution.

use crate::testing::TestResult;
use single_utilities::traits::FloatOps;
use statrs::distribution::{ContinuousCDF, Normal};

/// Sum, sum of squares and count of a sample, accumulated in f64.
fn sample_moments<T>(values: &[T]) -> (f64, f64, f64)
where
    T: FloatOps,
{
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for &v in values {
        let v = v.to_f64().unwrap();
        sum += v;
        sum_sq += v * v;
    }
    (sum, sum_sq, values.len() as f64)
}

/// Compare the means of `x` and `y`.
///
/// `t = (mean_x - mean_y) / sqrt(var_x / n_x + var_y / n_y)` with sample variances, and the
/// two-sided p-value `2 * (1 - Φ(|t|))`.
///
/// # Returns
///
/// `TestResult` with the statistic, p-value and standard error. Samples with fewer than two
/// values give statistic 0 and p-value 1.
pub fn z_test<T>(x: &[T], y: &[T]) -> TestResult<f64>
where
    T: FloatOps,
{
    if x.len() < 2 || y.len() < 2 {
        return TestResult::new(0.0, 1.0);
    }

    let (sum_x, sum_sq_x, nx) = sample_moments(x);
    let (sum_y, sum_sq_y, ny) = sample_moments(y);

    let mean_x = sum_x / nx;
    let mean_y = sum_y / ny;
    let var_x = ((sum_sq_x - sum_x * sum_x / nx) / (nx - 1.0)).max(0.0);
    let var_y = ((sum_sq_y - sum_y * sum_y / ny) / (ny - 1.0)).max(0.0);

    let std_err = (var_x / nx + var_y / ny).sqrt();
    let statistic = (mean_x - mean_y) / std_err;

    TestResult::new(statistic, normal_two_sided_p_value(statistic))
        .with_standard_error(std_err)
}

fn normal_two_sided_p_value(statistic: f64) -> f64 {
    if !statistic.is_finite() {
        return if statistic.is_infinite() { 0.0 } else { 1.0 };
    }
    match Normal::new(0.0, 1.0) {
        Ok(normal) => (2.0 * (1.0 - normal.cdf(statistic.abs()))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_z_test_known_values() {
        // means 2 and 5, both variances 1, n = 3: t = -3 / sqrt(2/3)
        let x = [1.0, 2.0, 3.0];
        let y = [4.0, 5.0, 6.0];
        let result = z_test(&x, &y);
        let expected_t = -3.0 / (2.0_f64 / 3.0).sqrt();
        assert_abs_diff_eq!(result.statistic, expected_t, epsilon = 1e-12);
        // 2 * (1 - Φ(3.674)) ≈ 2.3856e-4
        assert_abs_diff_eq!(result.p_value, 2.3856e-4, epsilon = 1e-7);
        assert_abs_diff_eq!(result.standard_error.unwrap(), (2.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_z_test_identical_samples() {
        let x = [0.2, 0.4, 0.6, 0.8];
        let result = z_test(&x, &x);
        assert_abs_diff_eq!(result.statistic, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.p_value, 1.0, epsilon = 1e-12);
        assert!(!result.is_significant(0.05));
    }

    #[test]
    fn test_z_test_small_samples() {
        let result = z_test(&[0.5], &[0.1, 0.2, 0.3]);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_z_test_zero_variance() {
        // no spread but different means: infinite statistic, p-value 0
        let result = z_test(&[1.0, 1.0], &[0.0, 0.0]);
        assert!(result.statistic.is_infinite());
        assert_eq!(result.p_value, 0.0);
    }
}
