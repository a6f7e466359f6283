//! File-level collaborators around the analysis core.
//!
//! - **[`expression`]**: delimited probe × sample tables and sample slicing into conditions
//! - **[`assignment`]**: gene → module label tables
//! - **[`report`]**: CSV output of dispersion reports and module statistics

pub mod assignment;
pub mod expression;
pub mod report;

pub use assignment::{parse_module_assignment, read_module_assignment};
pub use expression::{ExpressionTable, parse_expression_table, read_expression_table};
pub use report::{write_dispersion_report, write_module_stats};

/// Tab when the header line contains one, comma otherwise.
pub(crate) fn detect_delimiter(header_line: &str) -> u8 {
    if header_line.contains('\t') { b'\t' } else { b',' }
}

/// Strip surrounding quotes and whitespace from a field.
pub(crate) fn clean_field(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
