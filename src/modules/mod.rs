//! Module assignments and per-module column selection.
//!
//! A [`ModuleAssignment`] maps gene identifiers to module labels (usually color names from
//! an upstream clustering step). Genes missing from the map take no part in any module
//! computation. [`ModuleIndex`] resolves an assignment against the gene order of an
//! expression matrix once, so later stages work with column indices only.

use crate::error::{DiffCoexError, Result};
use ndarray::{Array2, ArrayView1};
use std::collections::{BTreeMap, BTreeSet};

pub mod stats;

/// Immutable gene → module label map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleAssignment {
    labels: BTreeMap<String, String>,
}

impl ModuleAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label for `gene`, if it was assigned.
    pub fn label_of(&self, gene: &str) -> Option<&str> {
        self.labels.get(gene).map(String::as_str)
    }

    /// Sorted, deduplicated module labels.
    pub fn unique_labels(&self) -> Vec<String> {
        let unique: BTreeSet<&String> = self.labels.values().collect();
        unique.into_iter().cloned().collect()
    }

    /// Genes assigned to `label`, in sorted gene-id order.
    pub fn genes_in(&self, label: &str) -> Vec<&str> {
        self.labels
            .iter()
            .filter_map(|(gene, l)| if l == label { Some(gene.as_str()) } else { None })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(g, l)| (g.as_str(), l.as_str()))
    }
}

impl<G, L> FromIterator<(G, L)> for ModuleAssignment
where
    G: Into<String>,
    L: Into<String>,
{
    /// Later entries for the same gene replace earlier ones.
    fn from_iter<I: IntoIterator<Item = (G, L)>>(iter: I) -> Self {
        ModuleAssignment {
            labels: iter
                .into_iter()
                .map(|(g, l)| (g.into(), l.into()))
                .collect(),
        }
    }
}

/// Column indices of every module, resolved against one gene ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleIndex {
    labels: Vec<String>,
    members: Vec<Vec<usize>>,
    n_genes: usize,
}

impl ModuleIndex {
    /// Resolve `assignment` against `gene_ids`. Modules whose genes are all absent from
    /// `gene_ids` are kept with no members.
    pub fn new(assignment: &ModuleAssignment, gene_ids: &[String]) -> Self {
        let labels = assignment.unique_labels();
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); labels.len()];
        for (col, gene) in gene_ids.iter().enumerate() {
            if let Some(label) = assignment.label_of(gene) {
                // labels is sorted, so the position is found by binary search
                if let Ok(pos) = labels.binary_search_by(|l| l.as_str().cmp(label)) {
                    members[pos].push(col);
                }
            }
        }

        for (label, cols) in labels.iter().zip(members.iter()) {
            if cols.is_empty() {
                log::warn!("Module '{}' has no genes in the expression matrix", label);
            }
        }

        ModuleIndex {
            labels,
            members,
            n_genes: gene_ids.len(),
        }
    }

    /// Sorted module labels; row/column order of every module-pair matrix.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn n_modules(&self) -> usize {
        self.labels.len()
    }

    /// Number of genes (matrix columns) the index was built against.
    pub fn n_genes(&self) -> usize {
        self.n_genes
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.binary_search_by(|l| l.as_str().cmp(label)).ok()
    }

    /// Member columns of `label` in gene order. Unknown labels have no members.
    pub fn members(&self, label: &str) -> &[usize] {
        match self.position(label) {
            Some(pos) => &self.members[pos],
            None => &[],
        }
    }

    pub fn members_at(&self, pos: usize) -> &[usize] {
        &self.members[pos]
    }
}

/// Columns of `matrix` whose gene maps to `label`, in `gene_ids` order.
///
/// Returns an empty vector when no gene matches. Fails when `gene_ids` does not have one
/// entry per column of `matrix`.
pub fn columns_for_module<'a>(
    matrix: &'a Array2<f64>,
    assignment: &ModuleAssignment,
    label: &str,
    gene_ids: &[String],
) -> Result<Vec<ArrayView1<'a, f64>>> {
    if gene_ids.len() != matrix.ncols() {
        return Err(DiffCoexError::dimension(
            "module column selection (gene ids vs columns)",
            matrix.ncols(),
            gene_ids.len(),
        ));
    }

    Ok(gene_ids
        .iter()
        .enumerate()
        .filter(|(_, gene)| assignment.label_of(gene) == Some(label))
        .map(|(col, _)| matrix.column(col))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn genes(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unique_labels_sorted() {
        let assignment: ModuleAssignment =
            [("g1", "red"), ("g2", "blue"), ("g3", "red"), ("g4", "brown")]
                .into_iter()
                .collect();
        assert_eq!(assignment.unique_labels(), vec!["blue", "brown", "red"]);
        assert_eq!(assignment.genes_in("red"), vec!["g1", "g3"]);
    }

    #[test]
    fn test_columns_for_module_follow_gene_order() {
        let matrix = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let gene_ids = genes(&["c", "a", "b"]);
        let assignment: ModuleAssignment =
            [("a", "red"), ("c", "red"), ("b", "blue")].into_iter().collect();

        let red = columns_for_module(&matrix, &assignment, "red", &gene_ids).unwrap();
        assert_eq!(red.len(), 2);
        assert_eq!(red[0].to_vec(), vec![1.0, 4.0]);
        assert_eq!(red[1].to_vec(), vec![2.0, 5.0]);

        let none = columns_for_module(&matrix, &assignment, "green", &gene_ids).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_columns_for_module_checks_gene_count() {
        let matrix = array![[1.0, 2.0]];
        let assignment = ModuleAssignment::new();
        let result = columns_for_module(&matrix, &assignment, "red", &genes(&["a"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_module_index_skips_unassigned_genes() {
        let gene_ids = genes(&["g1", "g2", "g3", "g4"]);
        let assignment: ModuleAssignment =
            [("g4", "red"), ("g1", "red"), ("g3", "blue"), ("gX", "grey")]
                .into_iter()
                .collect();
        let index = ModuleIndex::new(&assignment, &gene_ids);

        assert_eq!(index.labels(), &["blue", "grey", "red"]);
        assert_eq!(index.members("red"), &[0, 3]);
        assert_eq!(index.members("blue"), &[2]);
        assert!(index.members("grey").is_empty());
        assert!(index.members("missing").is_empty());
        assert_eq!(index.n_genes(), 4);
    }
}
