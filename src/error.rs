//! Error types for single-diffcoex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiffCoexError {
    #[error("Length mismatch: left has {left} values, right has {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Dimension mismatch in {context}: expected {expected}, got {got}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        got: usize,
    },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Invalid table: {reason}")]
    InvalidTable { reason: String },

    #[error("Permutation analysis cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config parsing error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, DiffCoexError>;

impl DiffCoexError {
    pub(crate) fn dimension(context: &str, expected: usize, got: usize) -> Self {
        DiffCoexError::DimensionMismatch {
            context: context.to_string(),
            expected,
            got,
        }
    }
}
