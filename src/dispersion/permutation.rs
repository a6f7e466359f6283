//! Permutation null distribution for the dispersion statistic.
//!
//! Samples of both conditions are pooled (see [`crate::preprocessing::combine`]) and
//! repeatedly re-split into two groups of the original sizes. Each split is scored with the
//! same dispersion routine used for the observed conditions, so all randomness lives in the
//! index sets produced by [`generate_permutations`].

use super::{DispersionMatrix, dispersion, dispersion_matrix_serial};
use crate::correlation::TieMethod;
use crate::error::{DiffCoexError, Result};
use crate::modules::ModuleIndex;
use ndarray::{Array2, Array3, ArrayView1, Axis, s};
use rand::Rng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const PROGRESS_EVERY: usize = 100;

/// One random re-split of the pooled samples.
///
/// `selected` holds the pooled row indices standing in for condition 1; all other rows of
/// `[0, total)` stand in for condition 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    selected: Vec<usize>,
    total: usize,
}

impl Permutation {
    /// Build a permutation from explicit indices. Indices must be distinct and below `total`.
    pub fn new(selected: Vec<usize>, total: usize) -> Result<Self> {
        let mut seen = vec![false; total];
        for &idx in &selected {
            if idx >= total {
                return Err(DiffCoexError::InvalidInput {
                    reason: format!("permutation index {} out of range 0..{}", idx, total),
                });
            }
            if seen[idx] {
                return Err(DiffCoexError::InvalidInput {
                    reason: format!("permutation index {} repeated", idx),
                });
            }
            seen[idx] = true;
        }
        Ok(Permutation { selected, total })
    }

    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    /// Size of the pooled index range.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Pooled rows not selected, in ascending order.
    pub fn complement(&self) -> Vec<usize> {
        let mut used = vec![false; self.total];
        for &idx in &self.selected {
            used[idx] = true;
        }
        (0..self.total).filter(|&i| !used[i]).collect()
    }

    /// Row subsets of `pooled` for surrogate condition 1 and surrogate condition 2.
    pub fn split(&self, pooled: &Array2<f64>) -> Result<(Array2<f64>, Array2<f64>)> {
        if pooled.nrows() != self.total {
            return Err(DiffCoexError::dimension(
                "permutation split (pooled rows)",
                self.total,
                pooled.nrows(),
            ));
        }
        let surrogate1 = pooled.select(Axis(0), &self.selected);
        let surrogate2 = pooled.select(Axis(0), &self.complement());
        Ok((surrogate1, surrogate2))
    }
}

/// Draw `trials` independent re-splits of `size_a + size_b` pooled samples.
///
/// Each trial shuffles the full index range with Fisher-Yates and keeps the first `size_a`
/// indices. All trials use the one generator passed in, so a seeded generator gives a
/// reproducible sequence.
pub fn generate_permutations<R>(
    size_a: usize,
    size_b: usize,
    trials: usize,
    rng: &mut R,
) -> Vec<Permutation>
where
    R: Rng + ?Sized,
{
    let total = size_a + size_b;
    (0..trials)
        .map(|_| {
            let mut indices: Vec<usize> = (0..total).collect();
            indices.shuffle(rng);
            indices.truncate(size_a);
            Permutation {
                selected: indices,
                total,
            }
        })
        .collect()
}

/// Dispersion of one module pair on the surrogate conditions defined by `permutation`.
pub fn null_value(
    permutation: &Permutation,
    pooled: &Array2<f64>,
    module_a: &str,
    module_b: &str,
    index: &ModuleIndex,
    ties: TieMethod,
) -> Result<f64> {
    let (surrogate1, surrogate2) = permutation.split(pooled)?;
    dispersion(module_a, module_b, &surrogate1, &surrogate2, index, ties)
}

/// Shared flag that stops a running permutation analysis before its next trial.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Dispersion values of every module pair under every permutation.
#[derive(Debug, Clone)]
pub struct NullDistribution {
    labels: Vec<String>,
    /// Shape `(modules, modules, trials)`.
    values: Array3<f64>,
}

impl NullDistribution {
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn trials(&self) -> usize {
        self.values.len_of(Axis(2))
    }

    /// Null values of module pair `(i, j)`, one per trial in permutation order.
    pub fn values(&self, i: usize, j: usize) -> ArrayView1<'_, f64> {
        self.values.slice(s![i, j, ..])
    }

    /// All null values, indexed `[i, j, trial]`.
    pub fn as_array(&self) -> &Array3<f64> {
        &self.values
    }

    /// Dispersion matrix of a single trial.
    pub fn trial(&self, t: usize) -> Array2<f64> {
        self.values.slice(s![.., .., t]).to_owned()
    }
}

/// Evaluate every module pair on every permutation.
///
/// Trials run in parallel over the read-only `pooled` matrix. The token is checked before each
/// trial; once cancelled the call returns [`DiffCoexError::Cancelled`].
pub fn null_distribution(
    permutations: &[Permutation],
    pooled: &Array2<f64>,
    index: &ModuleIndex,
    ties: TieMethod,
    cancel: &CancelToken,
) -> Result<NullDistribution> {
    let k = index.n_modules();
    let trials = permutations.len();
    log::info!(
        "Building null distribution: {} trials over {} module pairs",
        trials,
        k * k
    );

    let completed = AtomicUsize::new(0);
    let per_trial: Vec<DispersionMatrix> = permutations
        .par_iter()
        .map(|permutation| {
            if cancel.is_cancelled() {
                return Err(DiffCoexError::Cancelled);
            }
            let (surrogate1, surrogate2) = permutation.split(pooled)?;
            let cells = dispersion_matrix_serial(&surrogate1, &surrogate2, index, ties)?;

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % PROGRESS_EVERY == 0 {
                log::debug!("Permutation trials completed: {}/{}", done, trials);
            }
            Ok(cells)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut values = Array3::<f64>::zeros((k, k, trials));
    for (t, cells) in per_trial.iter().enumerate() {
        values.slice_mut(s![.., .., t]).assign(cells);
    }

    Ok(NullDistribution {
        labels: index.labels().to_vec(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::ModuleAssignment;
    use crate::preprocessing::combine;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn red_blue_index() -> ModuleIndex {
        let assignment: ModuleAssignment =
            [("g1", "red"), ("g2", "red"), ("g3", "blue")].into_iter().collect();
        let ids: Vec<String> = ["g1", "g2", "g3"].iter().map(|s| s.to_string()).collect();
        ModuleIndex::new(&assignment, &ids)
    }

    fn pooled_fixture() -> Array2<f64> {
        let a = array![[1.0, 5.0, 2.0], [2.0, 3.0, 9.0], [3.0, 4.0, 1.0], [4.0, 1.0, 7.0]];
        let b = array![[6.0, 2.0, 3.0], [5.0, 7.0, 4.0], [7.0, 6.0, 8.0]];
        combine(&a, &b).unwrap()
    }

    #[test]
    fn test_permutations_partition_the_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        let permutations = generate_permutations(6, 4, 50, &mut rng);
        assert_eq!(permutations.len(), 50);

        for permutation in &permutations {
            assert_eq!(permutation.selected().len(), 6);
            let complement = permutation.complement();
            assert_eq!(complement.len(), 4);

            let mut union: Vec<usize> = permutation
                .selected()
                .iter()
                .chain(complement.iter())
                .copied()
                .collect();
            union.sort_unstable();
            assert_eq!(union, (0..10).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_permutations_reproducible_from_seed() {
        let first = generate_permutations(5, 5, 20, &mut StdRng::seed_from_u64(99));
        let second = generate_permutations(5, 5, 20, &mut StdRng::seed_from_u64(99));
        let other = generate_permutations(5, 5, 20, &mut StdRng::seed_from_u64(100));
        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn test_permutation_new_validates_indices() {
        assert!(Permutation::new(vec![0, 3], 4).is_ok());
        assert!(Permutation::new(vec![0, 4], 4).is_err());
        assert!(Permutation::new(vec![1, 1], 4).is_err());
    }

    #[test]
    fn test_null_value_is_dispersion_on_row_subsets() {
        let pooled = pooled_fixture();
        let index = red_blue_index();
        let permutation = Permutation::new(vec![6, 0, 3, 2], 7).unwrap();

        let rows1 = pooled.select(Axis(0), &[6, 0, 3, 2]);
        let rows2 = pooled.select(Axis(0), &[1, 4, 5]);
        for (a, b) in [("red", "red"), ("red", "blue"), ("blue", "red")] {
            let expected = dispersion(a, b, &rows1, &rows2, &index, TieMethod::Ordinal).unwrap();
            let null = null_value(&permutation, &pooled, a, b, &index, TieMethod::Ordinal).unwrap();
            assert_eq!(null, expected);
        }
    }

    #[test]
    fn test_split_checks_pool_size() {
        let pooled = pooled_fixture();
        let permutation = Permutation::new(vec![0, 1], 5).unwrap();
        assert!(permutation.split(&pooled).is_err());
    }

    #[test]
    fn test_null_distribution_matches_null_value() {
        let pooled = pooled_fixture();
        let index = red_blue_index();
        let permutations = generate_permutations(4, 3, 12, &mut StdRng::seed_from_u64(3));

        let null = null_distribution(
            &permutations,
            &pooled,
            &index,
            TieMethod::Ordinal,
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(null.trials(), 12);
        assert_eq!(null.as_array().dim(), (2, 2, 12));

        let labels = index.labels().to_vec();
        for (i, a) in labels.iter().enumerate() {
            for (j, b) in labels.iter().enumerate() {
                for (t, permutation) in permutations.iter().enumerate() {
                    let expected =
                        null_value(permutation, &pooled, a, b, &index, TieMethod::Ordinal)
                            .unwrap();
                    assert_eq!(null.values(i, j)[t], expected);
                }
            }
        }
    }

    #[test]
    fn test_cancelled_token_stops_analysis() {
        let pooled = pooled_fixture();
        let index = red_blue_index();
        let permutations = generate_permutations(4, 3, 5, &mut StdRng::seed_from_u64(1));

        let cancel = CancelToken::new();
        cancel.cancel();
        let result = null_distribution(&permutations, &pooled, &index, TieMethod::Ordinal, &cancel);
        assert!(matches!(result, Err(DiffCoexError::Cancelled)));
    }
}
