use super::clean_field;
use crate::error::{DiffCoexError, Result};
use crate::modules::ModuleAssignment;
use std::fs;
use std::path::Path;

const GENE_HEADERS: [&str; 6] = ["gene", "genes", "gene_id", "probe", "probe_id", "id"];
const LABEL_HEADERS: [&str; 5] = ["module", "modules", "color", "colour", "label"];

fn is_header(gene: &str, label: &str) -> bool {
    let gene = gene.to_ascii_lowercase();
    let label = label.to_ascii_lowercase();
    GENE_HEADERS.contains(&gene.as_str()) || LABEL_HEADERS.contains(&label.as_str())
}

/// Read a gene → module table from `path`.
pub fn read_module_assignment<P: AsRef<Path>>(path: P) -> Result<ModuleAssignment> {
    let path = path.as_ref();
    log::info!("Loading module assignment from: {}", path.display());
    let content = fs::read_to_string(path)?;
    let assignment = parse_module_assignment(&content)?;
    log::info!(
        "  {} genes in {} modules",
        assignment.len(),
        assignment.unique_labels().len()
    );
    Ok(assignment)
}

/// Parse `gene label` pairs, one per line, separated by a comma or by whitespace.
///
/// A first line that looks like a header (`gene,module`, `probe color`, ...) is skipped.
/// Lines without exactly two fields are skipped with a warning.
pub fn parse_module_assignment(content: &str) -> Result<ModuleAssignment> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut skipped = 0usize;
    let mut first = true;

    for (line_no, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let fields: Vec<&str> = if trimmed.contains(',') {
            trimmed.split(',').map(clean_field).collect()
        } else {
            trimmed.split_whitespace().map(clean_field).collect()
        };

        if fields.len() != 2 || fields[0].is_empty() || fields[1].is_empty() {
            log::warn!("Skipping invalid module line {}: {}", line_no + 1, trimmed);
            skipped += 1;
            first = false;
            continue;
        }
        if first && is_header(fields[0], fields[1]) {
            first = false;
            continue;
        }
        first = false;
        pairs.push((fields[0].to_string(), fields[1].to_string()));
    }

    if pairs.is_empty() {
        return Err(DiffCoexError::InvalidTable {
            reason: format!("no module assignments found ({} lines skipped)", skipped),
        });
    }
    Ok(pairs.into_iter().collect())
}
