use super::DispersionMatrix;
use super::permutation::NullDistribution;
use crate::error::{DiffCoexError, Result};
use ndarray::Array2;

/// Observed dispersion together with its permutation counts and empirical p-values.
///
/// All matrices share the row/column order of `labels`. P-values are raw; any
/// multiple-comparison adjustment is left to the caller.
#[derive(Debug, Clone)]
pub struct SignificanceReport {
    pub labels: Vec<String>,
    /// Observed dispersion per module pair
    pub dispersion: DispersionMatrix,
    /// Number of null values greater than or equal to the observed value
    pub counts: Array2<usize>,
    /// `counts / trials`
    pub p_values: Array2<f64>,
    pub trials: usize,
}

impl SignificanceReport {
    fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn p_value(&self, module_a: &str, module_b: &str) -> Option<f64> {
        Some(self.p_values[[self.position(module_a)?, self.position(module_b)?]])
    }

    pub fn count(&self, module_a: &str, module_b: &str) -> Option<usize> {
        Some(self.counts[[self.position(module_a)?, self.position(module_b)?]])
    }

    pub fn observed(&self, module_a: &str, module_b: &str) -> Option<f64> {
        Some(self.dispersion[[self.position(module_a)?, self.position(module_b)?]])
    }

    /// Module pairs with p-value below `alpha`, ordered by ascending p-value.
    ///
    /// Pairs whose observed dispersion is not finite are left out, see [`Self::undefined_pairs`].
    pub fn significant_pairs(&self, alpha: f64) -> Vec<(String, String, f64)> {
        let mut pairs: Vec<(String, String, f64)> = self
            .p_values
            .indexed_iter()
            .filter(|&((i, j), &p)| p < alpha && self.dispersion[[i, j]].is_finite())
            .map(|((i, j), &p)| (self.labels[i].clone(), self.labels[j].clone(), p))
            .collect();
        pairs.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));
        pairs
    }

    /// Module pairs whose observed dispersion is NaN, usually from a constant member column.
    pub fn undefined_pairs(&self) -> Vec<(String, String)> {
        self.dispersion
            .indexed_iter()
            .filter(|&(_, v)| !v.is_finite())
            .map(|((i, j), _)| (self.labels[i].clone(), self.labels[j].clone()))
            .collect()
    }
}

/// Compare observed dispersion with its null distribution, pair by pair.
///
/// The empirical p-value of pair `(i, j)` is the fraction of trials whose null value is
/// `>=` the observed value. NaN on either side never counts.
pub fn summarize(observed: &DispersionMatrix, null: &NullDistribution) -> Result<SignificanceReport> {
    let k = null.labels().len();
    if observed.dim() != (k, k) {
        return Err(DiffCoexError::dimension(
            "significance (observed matrix vs module count)",
            k,
            observed.nrows(),
        ));
    }
    let trials = null.trials();
    if trials == 0 {
        return Err(DiffCoexError::InvalidInput {
            reason: "null distribution has no trials".to_string(),
        });
    }

    let counts = Array2::from_shape_fn((k, k), |(i, j)| {
        let obs = observed[[i, j]];
        null.values(i, j).iter().filter(|&&v| v >= obs).count()
    });
    let p_values = counts.mapv(|c| c as f64 / trials as f64);

    Ok(SignificanceReport {
        labels: null.labels().to_vec(),
        dispersion: observed.clone(),
        counts,
        p_values,
        trials,
    })
}
