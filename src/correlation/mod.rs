//! Rank and product-moment correlation between expression profiles.
//!
//! Spearman correlation is computed as the Pearson correlation of the two rank vectors. The
//! default ranking assigns strictly increasing ranks in sort order even when values are tied
//! ([`TieMethod::Ordinal`]); mid-rank averaging is available through [`TieMethod::Average`].

use crate::error::{DiffCoexError, Result};
use num_traits::Float;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use single_utilities::traits::FloatOps;
use std::cmp::Ordering;

/// How tied values are ranked before computing Spearman correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TieMethod {
    /// Each value gets its position in the (stable) ascending sort, ties included.
    #[default]
    Ordinal,
    /// Tied values share the mean of the positions they occupy.
    Average,
}

/// Assign 1-based ranks to `values` in ascending order.
///
/// The sort is stable, so under [`TieMethod::Ordinal`] tied values are ranked by their
/// original position. NaN values compare as equal to everything and keep their relative order.
pub fn rank<T>(values: &[T], ties: TieMethod) -> Vec<T>
where
    T: FloatOps,
{
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![T::zero(); n];
    match ties {
        TieMethod::Ordinal => {
            for (position, &original_idx) in order.iter().enumerate() {
                ranks[original_idx] = T::from(position + 1).unwrap();
            }
        }
        TieMethod::Average => {
            let mut i = 0;
            while i < n {
                let val = values[order[i]];
                let mut j = i + 1;
                while j < n && values[order[j]] == val {
                    j += 1;
                }

                // positions i..j share rank ((i + 1) + j) / 2
                let rank = T::from(i + j + 1).unwrap() / T::from(2.0).unwrap();
                for &original_idx in &order[i..j] {
                    ranks[original_idx] = rank;
                }
                i = j;
            }
        }
    }
    ranks
}

/// Pearson product-moment correlation of two equal-length vectors.
///
/// Returns NaN when either vector is constant (the denominator vanishes).
pub fn pearson<T>(x: &[T], y: &[T]) -> Result<T>
where
    T: FloatOps,
{
    if x.len() != y.len() {
        return Err(DiffCoexError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    Ok(pearson_unchecked(x, y))
}

/// Spearman rank correlation of two equal-length vectors.
///
/// # Arguments
///
/// * `x`, `y` - Expression profiles of two genes over the same samples
/// * `ties` - Ranking rule for tied values
///
/// # Returns
///
/// The correlation in [-1, 1], or NaN if either vector is constant. Fails with
/// [`DiffCoexError::LengthMismatch`] when the lengths differ.
pub fn spearman<T>(x: &[T], y: &[T], ties: TieMethod) -> Result<T>
where
    T: FloatOps,
{
    if x.len() != y.len() {
        return Err(DiffCoexError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    // ordinal ranks of a constant vector are not constant
    if is_constant(x) || is_constant(y) {
        return Ok(<T as Float>::nan());
    }
    let rx = rank(x, ties);
    let ry = rank(y, ties);
    Ok(pearson_unchecked(&rx, &ry))
}

/// True when every value equals the first one. Empty input counts as constant.
pub(crate) fn is_constant<T>(values: &[T]) -> bool
where
    T: FloatOps,
{
    match values.first() {
        Some(&first) => values.iter().all(|&v| v == first),
        None => true,
    }
}

/// Pearson correlation without the length check; callers guarantee `x.len() == y.len()`.
pub(crate) fn pearson_unchecked<T>(x: &[T], y: &[T]) -> T
where
    T: FloatOps,
{
    let n = T::from(x.len()).unwrap();

    let mut sum_x = T::zero();
    let mut sum_y = T::zero();
    for (&a, &b) in x.iter().zip(y.iter()) {
        sum_x += a;
        sum_y += b;
    }
    let mean_x = sum_x / n;
    let mean_y = sum_y / n;

    let mut numerator = T::zero();
    let mut denom_x = T::zero();
    let mut denom_y = T::zero();
    for (&a, &b) in x.iter().zip(y.iter()) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        numerator += dx * dy;
        denom_x += dx * dx;
        denom_y += dy * dy;
    }

    numerator / Float::sqrt(denom_x * denom_y)
}
