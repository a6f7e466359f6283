//! Module-level co-expression check independent of the permutation engine.
//!
//! For one module, all pairwise Pearson correlations among its genes are collected in each
//! condition, and the two collections are compared with a normal-approximation two-sample
//! test ([`crate::testing::inference::z_test`]).

use super::ModuleAssignment;
use crate::correlation::pearson;
use crate::data::GeneProfiles;
use crate::error::Result;
use crate::testing::inference::z_test;
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleStats {
    pub module: String,
    /// Genes assigned to the module
    pub size: usize,
    pub statistic: f64,
    pub p_value: f64,
}

/// Pearson correlation of every gene pair of `genes` present in `profiles`.
///
/// With `max_samples` set, each profile is cut to its first `max_samples` values before
/// correlating. Pairs with a non-finite correlation (a constant profile) are dropped.
pub fn module_correlations(
    genes: &[&str],
    profiles: &GeneProfiles,
    max_samples: Option<usize>,
) -> Result<Vec<f64>> {
    let truncate = |values: &'_ [f64]| -> usize {
        match max_samples {
            Some(m) => values.len().min(m),
            None => values.len(),
        }
    };

    let mut correlations = Vec::new();
    let mut dropped = 0usize;
    for i in 0..genes.len() {
        let Some(expr1) = profiles.get(genes[i]) else {
            continue;
        };
        for gene2 in &genes[i + 1..] {
            let Some(expr2) = profiles.get(*gene2) else {
                continue;
            };
            let corr = pearson(&expr1[..truncate(expr1)], &expr2[..truncate(expr2)])?;
            if corr.is_finite() {
                correlations.push(corr);
            } else {
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        log::debug!("Dropped {} non-finite correlations", dropped);
    }
    Ok(correlations)
}

/// Compare within-module correlation between condition `x` and condition `y`.
pub fn module_stats(
    module: &str,
    assignment: &ModuleAssignment,
    x: &GeneProfiles,
    y: &GeneProfiles,
    max_samples: Option<usize>,
) -> Result<ModuleStats> {
    let genes = assignment.genes_in(module);
    let corr_x = module_correlations(&genes, x, max_samples)?;
    let corr_y = module_correlations(&genes, y, max_samples)?;
    let result = z_test(&corr_x, &corr_y);

    Ok(ModuleStats {
        module: module.to_string(),
        size: genes.len(),
        statistic: result.statistic,
        p_value: result.p_value,
    })
}

/// [`module_stats`] for every module of `assignment`, sorted by module label.
pub fn all_module_stats(
    assignment: &ModuleAssignment,
    x: &GeneProfiles,
    y: &GeneProfiles,
    max_samples: Option<usize>,
) -> Result<Vec<ModuleStats>> {
    let labels = assignment.unique_labels();
    log::info!("Testing {} modules", labels.len());
    labels
        .par_iter()
        .map(|label| module_stats(label, assignment, x, y, max_samples))
        .collect()
}
