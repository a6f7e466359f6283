//! # single-diffcoex
//!
//! Differential co-expression analysis between two conditions, part of the single-rust ecosystem.
//!
//! Genes are grouped into modules by an upstream clustering step. For each pair of modules this
//! crate measures how much their Spearman co-expression pattern changes between two conditions
//! (the *dispersion*), and estimates whether the change exceeds chance by re-splitting the pooled
//! samples at random.
//!
//! ## Core Features
//!
//! - **Rank Correlation**: Spearman correlation with ordinal or averaged tie ranking
//! - **Dispersion**: Within-module and cross-module change of the correlation structure
//! - **Permutation Testing**: Seeded, parallel null distributions with cancellation
//! - **Module Statistics**: Pearson-based two-sample comparison of module correlations
//! - **Preprocessing**: log2 transform, quantile normalization, column scaling
//!
//! ## Quick Start
//!
//! Build two [`data::ConditionData`] matrices (samples × genes) and a
//! [`modules::ModuleAssignment`], then call [`analysis::DiffCoexAnalysis::run`].
//!
//! ## Module Organization
//!
//! - **[`correlation`]**: Ranking, Spearman and Pearson correlation
//! - **[`dispersion`]**: Dispersion statistic, permutation engine and empirical p-values
//! - **[`modules`]**: Module assignments, column selection and module statistics
//! - **[`preprocessing`]**: Transformations applied before the analysis
//! - **[`testing`]**: Two-sample z-test and multiple testing correction
//! - **[`io`]**: Reading expression and module tables, writing reports

pub mod analysis;
pub mod cli;
pub mod config;
pub mod correlation;
pub mod data;
pub mod dispersion;
pub mod error;
pub mod io;
pub mod modules;
pub mod preprocessing;
pub mod testing;

pub use analysis::DiffCoexAnalysis;
pub use config::AnalysisConfig;
pub use correlation::{TieMethod, spearman};
pub use data::ConditionData;
pub use dispersion::permutation::CancelToken;
pub use dispersion::significance::SignificanceReport;
pub use error::{DiffCoexError, Result};
pub use modules::ModuleAssignment;
