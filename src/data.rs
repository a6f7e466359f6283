//! Condition matrices and their gene identifiers.

use crate::error::{DiffCoexError, Result};
use ndarray::Array2;
use std::collections::HashMap;

/// Expression profiles keyed by gene identifier.
pub type GeneProfiles = HashMap<String, Vec<f64>>;

/// Samples × genes expression matrix of one condition, with one identifier per column.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionData {
    matrix: Array2<f64>,
    gene_ids: Vec<String>,
}

impl ConditionData {
    /// Fails when `gene_ids` does not have exactly one entry per matrix column.
    pub fn new(matrix: Array2<f64>, gene_ids: Vec<String>) -> Result<Self> {
        if matrix.ncols() != gene_ids.len() {
            return Err(DiffCoexError::dimension(
                "condition data (gene ids vs columns)",
                matrix.ncols(),
                gene_ids.len(),
            ));
        }
        Ok(ConditionData { matrix, gene_ids })
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn gene_ids(&self) -> &[String] {
        &self.gene_ids
    }

    pub fn n_samples(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_genes(&self) -> usize {
        self.matrix.ncols()
    }

    /// Column profiles keyed by gene id. A repeated id keeps its last column.
    pub fn to_gene_map(&self) -> GeneProfiles {
        self.gene_ids
            .iter()
            .enumerate()
            .map(|(col, gene)| (gene.clone(), self.matrix.column(col).to_vec()))
            .collect()
    }
}
