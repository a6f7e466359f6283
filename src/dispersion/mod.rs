//! Module-to-module dispersion between two conditions.
//!
//! The dispersion of a module pair is the root-mean-square change in Spearman correlation,
//! between condition 1 and condition 2, over the gene pairs the two modules span. The same
//! routines score the observed conditions and every permutation surrogate, see
//! [`permutation`].

use crate::correlation::{TieMethod, is_constant, pearson_unchecked, rank};
use crate::error::{DiffCoexError, Result};
use crate::modules::ModuleIndex;
use ndarray::Array2;
use rayon::prelude::*;

pub mod permutation;
pub mod significance;

/// Square matrix of dispersion values indexed by [`ModuleIndex::labels`].
pub type DispersionMatrix = Array2<f64>;

/// Rank vectors of a module's member columns within one condition. `None` marks a
/// constant column, whose correlation with anything is NaN.
type RankedModule = Vec<Option<Vec<f64>>>;

fn rank_module(matrix: &Array2<f64>, columns: &[usize], ties: TieMethod) -> RankedModule {
    columns
        .iter()
        .map(|&col| {
            let values = matrix.column(col).to_vec();
            if is_constant(&values) {
                None
            } else {
                Some(rank(&values, ties))
            }
        })
        .collect()
}

#[inline]
fn rank_correlation(a: &Option<Vec<f64>>, b: &Option<Vec<f64>>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => pearson_unchecked(a, b),
        _ => f64::NAN,
    }
}

/// Dispersion from pre-ranked member columns.
///
/// `a1`/`b1` hold the ranks of modules A and B in condition 1, `a2`/`b2` in condition 2.
fn dispersion_from_ranks(
    same_module: bool,
    a1: &RankedModule,
    b1: &RankedModule,
    a2: &RankedModule,
    b2: &RankedModule,
) -> f64 {
    if same_module {
        let n = a1.len();
        if n < 2 {
            return 0.0;
        }

        let mut sum_dif_cor_sq = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let dif = rank_correlation(&a1[i], &a1[j]) - rank_correlation(&a2[i], &a2[j]);
                sum_dif_cor_sq += dif * dif;
            }
        }

        let n_pairs = (n * (n - 1)) as f64 / 2.0;
        ((sum_dif_cor_sq / 2.0) / n_pairs).sqrt()
    } else {
        let n1 = a1.len();
        let n2 = b1.len();
        if n1 == 0 || n2 == 0 {
            return 0.0;
        }

        let mut sum_dif_cor_sq = 0.0;
        for i in 0..n1 {
            for j in 0..n2 {
                let dif = rank_correlation(&a1[i], &b1[j]) - rank_correlation(&a2[i], &b2[j]);
                sum_dif_cor_sq += dif * dif;
            }
        }

        (sum_dif_cor_sq / (n1 * n2) as f64).sqrt()
    }
}

fn check_dimensions(
    condition1: &Array2<f64>,
    condition2: &Array2<f64>,
    index: &ModuleIndex,
) -> Result<()> {
    if condition1.ncols() != index.n_genes() {
        return Err(DiffCoexError::dimension(
            "dispersion (condition 1 columns vs genes)",
            index.n_genes(),
            condition1.ncols(),
        ));
    }
    if condition2.ncols() != index.n_genes() {
        return Err(DiffCoexError::dimension(
            "dispersion (condition 2 columns vs genes)",
            index.n_genes(),
            condition2.ncols(),
        ));
    }
    Ok(())
}

/// Dispersion between `module_a` and `module_b` across two condition matrices.
///
/// # Arguments
///
/// * `module_a`, `module_b` - Module labels; equal labels give the within-module statistic
/// * `condition1`, `condition2` - Samples × genes matrices sharing the gene order of `index`
/// * `index` - Module membership resolved against that gene order
/// * `ties` - Ranking rule for the Spearman correlations
///
/// # Returns
///
/// `sqrt((Σ/2) / C(n,2))` within a module of `n` members, `sqrt(Σ / (n1·n2))` across two
/// modules, where `Σ` sums the squared correlation differences. Modules with no gene
/// pair to compare (unknown label, no members, or a single member within itself) give
/// 0.0. NaN propagates when a member column is constant in either condition.
pub fn dispersion(
    module_a: &str,
    module_b: &str,
    condition1: &Array2<f64>,
    condition2: &Array2<f64>,
    index: &ModuleIndex,
    ties: TieMethod,
) -> Result<f64> {
    check_dimensions(condition1, condition2, index)?;

    let members_a = index.members(module_a);
    let a1 = rank_module(condition1, members_a, ties);
    let a2 = rank_module(condition2, members_a, ties);

    if module_a == module_b {
        return Ok(dispersion_from_ranks(true, &a1, &a1, &a2, &a2));
    }

    let members_b = index.members(module_b);
    let b1 = rank_module(condition1, members_b, ties);
    let b2 = rank_module(condition2, members_b, ties);
    Ok(dispersion_from_ranks(false, &a1, &b1, &a2, &b2))
}

/// Every module's ranked columns in both conditions, computed once per matrix pair.
struct RankedConditions {
    condition1: Vec<RankedModule>,
    condition2: Vec<RankedModule>,
}

impl RankedConditions {
    fn new(
        condition1: &Array2<f64>,
        condition2: &Array2<f64>,
        index: &ModuleIndex,
        ties: TieMethod,
    ) -> Self {
        let rank_all = |matrix: &Array2<f64>| -> Vec<RankedModule> {
            (0..index.n_modules())
                .map(|pos| rank_module(matrix, index.members_at(pos), ties))
                .collect()
        };
        RankedConditions {
            condition1: rank_all(condition1),
            condition2: rank_all(condition2),
        }
    }

    fn cell(&self, i: usize, j: usize) -> f64 {
        dispersion_from_ranks(
            i == j,
            &self.condition1[i],
            &self.condition1[j],
            &self.condition2[i],
            &self.condition2[j],
        )
    }
}

/// Dispersion for every ordered module pair, cells computed in parallel.
///
/// Row and column order follow [`ModuleIndex::labels`]; the diagonal holds the
/// within-module values.
pub fn dispersion_matrix(
    condition1: &Array2<f64>,
    condition2: &Array2<f64>,
    index: &ModuleIndex,
    ties: TieMethod,
) -> Result<DispersionMatrix> {
    check_dimensions(condition1, condition2, index)?;

    let k = index.n_modules();
    let ranked = RankedConditions::new(condition1, condition2, index, ties);
    let cells: Vec<f64> = (0..k * k)
        .into_par_iter()
        .map(|cell| ranked.cell(cell / k, cell % k))
        .collect();

    Array2::from_shape_vec((k, k), cells).map_err(|e| DiffCoexError::InvalidInput {
        reason: format!("dispersion matrix shape: {}", e),
    })
}

/// Serial variant used inside parallel permutation trials.
pub(crate) fn dispersion_matrix_serial(
    condition1: &Array2<f64>,
    condition2: &Array2<f64>,
    index: &ModuleIndex,
    ties: TieMethod,
) -> Result<DispersionMatrix> {
    check_dimensions(condition1, condition2, index)?;

    let k = index.n_modules();
    let ranked = RankedConditions::new(condition1, condition2, index, ties);
    Ok(Array2::from_shape_fn((k, k), |(i, j)| ranked.cell(i, j)))
}
