//! Command-line interface for single-diffcoex

use crate::correlation::TieMethod;
use crate::error::{DiffCoexError, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::collections::HashSet;

#[derive(Parser)]
#[command(name = "single-diffcoex")]
#[command(author = "Ian F. Diks")]
#[command(version)]
#[command(about = "Differential co-expression of gene modules between two conditions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Permutation test of module dispersion
    #[command(
        long_about = "Permutation test of module dispersion\n\n\
            Computes the within- and cross-module dispersion of Spearman correlations between\n\
            condition A and condition B, then estimates empirical p-values by re-splitting\n\
            the pooled samples.",
        after_long_help = "\
Examples:
  single-diffcoex dispersion -e expression.tsv -m modules.txt \\
    --samples-a 0-26 --samples-b 27-37 --normalize -o results/

  single-diffcoex dispersion -e expression.tsv -m modules.txt \\
    --samples-a 0-9,20 --samples-b 10-19 --permutations 5000 --seed 7 --adjust bh"
    )]
    Dispersion {
        #[command(flatten)]
        input: InputArgs,

        /// Number of permutation trials [default: 1000]
        #[arg(short, long)]
        permutations: Option<usize>,

        /// Seed for the permutation generator [default: 42]
        #[arg(long)]
        seed: Option<u64>,

        /// Tie ranking for Spearman correlation [default: ordinal]
        #[arg(long, value_enum)]
        ties: Option<TieMethod>,

        /// Additionally write adjusted p-values
        #[arg(long, value_enum)]
        adjust: Option<AdjustArg>,

        /// Output directory
        #[arg(short, long, default_value = "diffcoex_results")]
        output: String,
    },

    /// Pearson-based comparison of within-module correlation
    ModuleStats {
        #[command(flatten)]
        input: InputArgs,

        /// Use only the first N samples of each profile
        #[arg(long, value_name = "N")]
        max_samples: Option<usize>,

        /// Output file path
        #[arg(short, long, default_value = "module_stats.csv")]
        output: String,
    },
}

#[derive(Args)]
pub struct InputArgs {
    /// Path to expression table (probes × samples, tab or comma separated)
    #[arg(short, long)]
    pub expression: String,

    /// Path to gene → module table
    #[arg(short, long)]
    pub modules: String,

    /// Sample columns of condition A, 0-based (e.g. 0-26,30)
    #[arg(long, value_name = "RANGES")]
    pub samples_a: String,

    /// Sample columns of condition B, 0-based
    #[arg(long, value_name = "RANGES")]
    pub samples_b: String,

    /// Apply log2 and quantile normalization before the analysis
    #[arg(long)]
    pub normalize: bool,

    /// TOML file with analysis settings; flags take precedence
    #[arg(short, long)]
    pub config: Option<String>,

    /// Worker threads [default: all cores]
    #[arg(short, long)]
    pub threads: Option<usize>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum AdjustArg {
    /// Benjamini-Hochberg
    Bh,
}

/// Parse a comma-separated list of 0-based indices and inclusive ranges, e.g. `0-26,30`.
pub fn parse_sample_ranges(spec: &str) -> Result<Vec<usize>> {
    let invalid = |part: &str| DiffCoexError::InvalidInput {
        reason: format!("invalid sample range '{}'", part),
    };

    let mut indices = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start: usize = start.trim().parse().map_err(|_| invalid(part))?;
                let end: usize = end.trim().parse().map_err(|_| invalid(part))?;
                if end < start {
                    return Err(invalid(part));
                }
                indices.extend(start..=end);
            }
            None => indices.push(part.parse().map_err(|_| invalid(part))?),
        }
    }

    if indices.is_empty() {
        return Err(DiffCoexError::InvalidInput {
            reason: "empty sample selection".to_string(),
        });
    }
    Ok(indices)
}

/// Fail when an index repeats within a condition or is shared by both conditions.
pub fn check_sample_selection(samples_a: &[usize], samples_b: &[usize]) -> Result<()> {
    let mut seen = HashSet::with_capacity(samples_a.len() + samples_b.len());
    for (condition, samples) in [("A", samples_a), ("B", samples_b)] {
        for &idx in samples {
            if !seen.insert(idx) {
                return Err(DiffCoexError::InvalidInput {
                    reason: format!("sample {} selected more than once (condition {})", idx, condition),
                });
            }
        }
    }
    Ok(())
}
