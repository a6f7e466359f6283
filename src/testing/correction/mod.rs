use anyhow::{Result, anyhow};
use std::cmp::Ordering;

/// Apply Benjamini-Hochberg (BH) procedure for controlling false discovery rate
///
/// The BH procedure controls the false discovery rate (FDR), which is the expected
/// proportion of false positives among all rejected null hypotheses.
///
/// # Arguments
/// * `p_values` - A slice of p-values to adjust
///
/// # Returns
/// * `Result<Vec<f64>>` - Vector of adjusted p-values, in input order
pub fn benjamini_hochberg_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    let n = p_values.len();
    if n == 0 {
        return Err(anyhow!("Empty p-value array"));
    }

    for (i, &p) in p_values.iter().enumerate() {
        if !(0.0..=1.0).contains(&p) {
            return Err(anyhow!("Invalid p-value at index {}: {}", i, p));
        }
    }

    let mut indexed_p_values: Vec<(usize, f64)> =
        p_values.iter().enumerate().map(|(i, &p)| (i, p)).collect();
    indexed_p_values.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    // step down from the largest p-value keeping the running minimum
    let mut adjusted_p_values = vec![0.0; n];
    let mut running_min = 1.0_f64;
    for rank in (0..n).rev() {
        let (original_idx, p) = indexed_p_values[rank];
        let adjusted = (p * n as f64 / (rank + 1) as f64).min(1.0);
        running_min = running_min.min(adjusted);
        adjusted_p_values[original_idx] = running_min;
    }

    Ok(adjusted_p_values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_benjamini_hochberg_empty_input() {
        let result = benjamini_hochberg_correction(&[]);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().to_string(), "Empty p-value array");
    }

    #[test]
    fn test_benjamini_hochberg_invalid_pvalues() {
        let result = benjamini_hochberg_correction(&[0.01, -0.5, 0.03]);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid p-value at index 1")
        );
        assert!(benjamini_hochberg_correction(&[0.01, 1.5]).is_err());
    }

    #[test]
    fn test_benjamini_hochberg_ordered_pvalues() {
        let p_values = vec![0.01, 0.02, 0.03, 0.04, 0.05];
        let adjusted = benjamini_hochberg_correction(&p_values).unwrap();
        for a in adjusted {
            assert_relative_eq!(a, 0.05, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_benjamini_hochberg_unordered_pvalues() {
        let p_values = vec![0.04, 0.001, 0.5, 0.02];
        // sorted: 0.001 -> 0.004, 0.02 -> 0.04, 0.04 -> 0.0533, 0.5 -> 0.5
        let expected = vec![0.04 * 4.0 / 3.0, 0.004, 0.5, 0.04];
        let adjusted = benjamini_hochberg_correction(&p_values).unwrap();
        for (a, e) in adjusted.iter().zip(expected.iter()) {
            assert_relative_eq!(*a, *e, epsilon = 1e-10);
        }
    }
}
