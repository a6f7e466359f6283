//! Matrix preparation ahead of the dispersion analysis.
//!
//! - **[`scaling`]**: column z-scores and pooling of two conditions for resampling
//! - **[`normalization`]**: log2 transform and the reference quantile normalization

pub mod normalization;
pub mod scaling;

pub use normalization::{log2_transform, quantile_normalize};
pub use scaling::{combine, scale_columns};
