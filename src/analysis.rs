//! End-to-end differential co-expression analysis of two conditions.

use crate::config::AnalysisConfig;
use crate::data::ConditionData;
use crate::dispersion::dispersion_matrix;
use crate::dispersion::permutation::{CancelToken, generate_permutations, null_distribution};
use crate::dispersion::significance::{SignificanceReport, summarize};
use crate::error::{DiffCoexError, Result};
use crate::modules::stats::{ModuleStats, all_module_stats};
use crate::modules::{ModuleAssignment, ModuleIndex};
use crate::preprocessing::combine;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Runs the permutation analysis and the module statistics with one configuration.
#[derive(Debug, Clone, Default)]
pub struct DiffCoexAnalysis {
    config: AnalysisConfig,
}

impl DiffCoexAnalysis {
    pub fn new(config: AnalysisConfig) -> Self {
        DiffCoexAnalysis { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Observed dispersion of every module pair with empirical p-values.
    ///
    /// Both conditions must carry the same genes in the same column order. The pooled,
    /// column-scaled samples are re-split `config.permutations` times from a generator
    /// seeded with `config.seed`, so a fixed seed reproduces the report exactly.
    pub fn run(
        &self,
        condition_a: &ConditionData,
        condition_b: &ConditionData,
        assignment: &ModuleAssignment,
        cancel: &CancelToken,
    ) -> Result<SignificanceReport> {
        self.config.validate()?;
        check_gene_alignment(condition_a, condition_b)?;

        log::info!(
            "Differential co-expression: {} genes, {} vs {} samples",
            condition_a.n_genes(),
            condition_a.n_samples(),
            condition_b.n_samples()
        );

        self.in_pool(|| {
            let index = ModuleIndex::new(assignment, condition_a.gene_ids());
            log::info!("Modules: {}", index.n_modules());

            log::info!("Computing observed dispersion");
            let observed = dispersion_matrix(
                condition_a.matrix(),
                condition_b.matrix(),
                &index,
                self.config.ties,
            )?;

            let pooled = combine(condition_a.matrix(), condition_b.matrix())?;
            log::debug!("Pooled matrix: {} x {}", pooled.nrows(), pooled.ncols());

            let mut rng = StdRng::seed_from_u64(self.config.seed);
            let permutations = generate_permutations(
                condition_a.n_samples(),
                condition_b.n_samples(),
                self.config.permutations,
                &mut rng,
            );

            let null = null_distribution(&permutations, &pooled, &index, self.config.ties, cancel)?;

            log::info!("Summarizing {} trials", null.trials());
            summarize(&observed, &null)
        })
    }

    /// Pearson-based module comparison for every module of `assignment`.
    pub fn module_stats(
        &self,
        condition_a: &ConditionData,
        condition_b: &ConditionData,
        assignment: &ModuleAssignment,
    ) -> Result<Vec<ModuleStats>> {
        self.config.validate()?;
        let x = condition_a.to_gene_map();
        let y = condition_b.to_gene_map();
        self.in_pool(|| all_module_stats(assignment, &x, &y, self.config.max_samples))
    }

    fn in_pool<F, R>(&self, op: F) -> Result<R>
    where
        F: FnOnce() -> Result<R> + Send,
        R: Send,
    {
        match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| DiffCoexError::InvalidInput {
                        reason: format!("thread pool: {}", e),
                    })?;
                log::debug!("Using dedicated pool with {} threads", threads);
                pool.install(op)
            }
            None => op(),
        }
    }
}

fn check_gene_alignment(condition_a: &ConditionData, condition_b: &ConditionData) -> Result<()> {
    if condition_a.n_genes() != condition_b.n_genes() {
        return Err(DiffCoexError::dimension(
            "conditions (gene columns)",
            condition_a.n_genes(),
            condition_b.n_genes(),
        ));
    }
    if let Some(col) = condition_a
        .gene_ids()
        .iter()
        .zip(condition_b.gene_ids())
        .position(|(a, b)| a != b)
    {
        return Err(DiffCoexError::InvalidInput {
            reason: format!(
                "gene order differs at column {}: '{}' vs '{}'",
                col,
                condition_a.gene_ids()[col],
                condition_b.gene_ids()[col]
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn condition(values: ndarray::Array2<f64>, genes: &[&str]) -> ConditionData {
        ConditionData::new(values, genes.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    fn config(permutations: usize) -> AnalysisConfig {
        AnalysisConfig {
            permutations,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn test_identical_conditions_are_never_significant() {
        let values = array![[1.0, 2.0], [2.0, 3.0], [3.0, 4.0], [4.0, 5.0]];
        let a = condition(values.clone(), &["g1", "g2"]);
        let b = condition(values, &["g1", "g2"]);
        let assignment: ModuleAssignment = [("g1", "red"), ("g2", "red")].into_iter().collect();

        let report = DiffCoexAnalysis::new(config(100))
            .run(&a, &b, &assignment, &CancelToken::new())
            .unwrap();
        assert_eq!(report.labels, vec!["red"]);
        assert_eq!(report.observed("red", "red"), Some(0.0));
        assert_eq!(report.p_value("red", "red"), Some(1.0));
        assert_eq!(report.trials, 100);
    }

    #[test]
    fn test_seed_reproduces_report() {
        let a = condition(
            array![[1.0, 4.0, 2.0], [2.0, 3.0, 5.0], [3.0, 1.0, 4.0], [4.0, 2.0, 1.0]],
            &["g1", "g2", "g3"],
        );
        let b = condition(
            array![[3.0, 1.0, 2.0], [1.0, 2.0, 3.0], [4.0, 4.0, 1.0], [2.0, 3.0, 4.0]],
            &["g1", "g2", "g3"],
        );
        let assignment: ModuleAssignment =
            [("g1", "red"), ("g2", "red"), ("g3", "blue")].into_iter().collect();

        let analysis = DiffCoexAnalysis::new(config(30));
        let first = analysis.run(&a, &b, &assignment, &CancelToken::new()).unwrap();
        let second = analysis.run(&a, &b, &assignment, &CancelToken::new()).unwrap();
        assert_eq!(first.counts, second.counts);

        let threaded = DiffCoexAnalysis::new(AnalysisConfig {
            threads: Some(2),
            ..config(30)
        });
        let third = threaded.run(&a, &b, &assignment, &CancelToken::new()).unwrap();
        assert_eq!(first.counts, third.counts);
    }

    #[test]
    fn test_gene_order_must_match() {
        let a = condition(array![[1.0, 2.0], [2.0, 1.0]], &["g1", "g2"]);
        let b = condition(array![[1.0, 2.0], [2.0, 1.0]], &["g2", "g1"]);
        let result = DiffCoexAnalysis::new(config(5)).run(
            &a,
            &b,
            &ModuleAssignment::new(),
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(DiffCoexError::InvalidInput { .. })));
    }

    #[test]
    fn test_cancelled_run() {
        let values = array![[1.0, 2.0], [2.0, 3.0], [3.0, 4.0]];
        let a = condition(values.clone(), &["g1", "g2"]);
        let b = condition(values, &["g1", "g2"]);
        let assignment: ModuleAssignment = [("g1", "red"), ("g2", "red")].into_iter().collect();
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = DiffCoexAnalysis::new(config(10)).run(&a, &b, &assignment, &cancel);
        assert!(matches!(result, Err(DiffCoexError::Cancelled)));
    }
}
