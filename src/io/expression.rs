use super::{clean_field, detect_delimiter};
use crate::data::ConditionData;
use crate::error::{DiffCoexError, Result};
use crate::preprocessing::{log2_transform, quantile_normalize};
use ndarray::{Array2, Axis};
use std::fs;
use std::path::Path;

/// Probe × sample expression values as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionTable {
    pub probe_ids: Vec<String>,
    pub sample_ids: Vec<String>,
    /// Rows are probes, columns are samples.
    pub values: Array2<f64>,
}

impl ExpressionTable {
    pub fn new(probe_ids: Vec<String>, sample_ids: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if values.nrows() != probe_ids.len() {
            return Err(DiffCoexError::dimension(
                "expression table (probe ids vs rows)",
                values.nrows(),
                probe_ids.len(),
            ));
        }
        if values.ncols() != sample_ids.len() {
            return Err(DiffCoexError::dimension(
                "expression table (sample ids vs columns)",
                values.ncols(),
                sample_ids.len(),
            ));
        }
        Ok(ExpressionTable {
            probe_ids,
            sample_ids,
            values,
        })
    }

    pub fn n_probes(&self) -> usize {
        self.probe_ids.len()
    }

    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Log2 transform followed by quantile normalization, both over sample columns.
    pub fn normalized(&self) -> Self {
        let values = quantile_normalize(&log2_transform(&self.values));
        ExpressionTable {
            probe_ids: self.probe_ids.clone(),
            sample_ids: self.sample_ids.clone(),
            values,
        }
    }

    /// Samples × genes matrix of the chosen sample columns, in the order given.
    pub fn condition(&self, samples: &[usize]) -> Result<ConditionData> {
        if let Some(&bad) = samples.iter().find(|&&s| s >= self.n_samples()) {
            return Err(DiffCoexError::InvalidInput {
                reason: format!(
                    "sample index {} out of range (table has {} samples)",
                    bad,
                    self.n_samples()
                ),
            });
        }
        let matrix = self.values.select(Axis(1), samples).reversed_axes();
        // reversed_axes leaves a column-major layout; store it row-major
        let matrix = matrix.as_standard_layout().into_owned();
        ConditionData::new(matrix, self.probe_ids.clone())
    }
}

/// Read a delimited expression table; tab or comma is detected from the header line.
pub fn read_expression_table<P: AsRef<Path>>(path: P) -> Result<ExpressionTable> {
    let path = path.as_ref();
    log::info!("Loading expression table from: {}", path.display());
    let content = fs::read_to_string(path)?;
    let table = parse_expression_table(&content)?;
    log::info!("  {} probes, {} samples", table.n_probes(), table.n_samples());
    Ok(table)
}

/// Parse an expression table from text.
///
/// The header holds an identifier column followed by sample names; each further row holds
/// a probe id and one value per sample. A row with the wrong number of fields is an error.
/// Cells that do not parse as finite numbers (`NA`, `NaN`, `inf`) are read as 0.0.
pub fn parse_expression_table(content: &str) -> Result<ExpressionTable> {
    let header_line = content
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| DiffCoexError::InvalidTable {
            reason: "empty expression table".to_string(),
        })?;
    let delimiter = detect_delimiter(header_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(DiffCoexError::InvalidTable {
            reason: "header needs an identifier column and at least one sample".to_string(),
        });
    }
    let sample_ids: Vec<String> = headers.iter().skip(1).map(|s| clean_field(s).to_string()).collect();
    let n_samples = sample_ids.len();

    let mut probe_ids = Vec::new();
    let mut flat: Vec<f64> = Vec::new();
    let mut unparsed = 0usize;
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        if record.len() != n_samples + 1 {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(DiffCoexError::InvalidTable {
                reason: format!(
                    "line {} has {} fields, expected {}",
                    line,
                    record.len(),
                    n_samples + 1
                ),
            });
        }

        probe_ids.push(clean_field(&record[0]).to_string());
        for field in record.iter().skip(1) {
            match clean_field(field).parse::<f64>() {
                Ok(v) if v.is_finite() => flat.push(v),
                _ => {
                    unparsed += 1;
                    flat.push(0.0);
                }
            }
        }
    }

    if probe_ids.is_empty() {
        return Err(DiffCoexError::InvalidTable {
            reason: "no probe rows found".to_string(),
        });
    }
    if unparsed > 0 {
        log::warn!("{} non-numeric expression cells read as 0.0", unparsed);
    }

    let values = Array2::from_shape_vec((probe_ids.len(), n_samples), flat).map_err(|e| {
        DiffCoexError::InvalidTable {
            reason: format!("cannot shape expression values: {}", e),
        }
    })?;
    ExpressionTable::new(probe_ids, sample_ids, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_parse_tab_table() {
        let content = "ID\ts1\ts2\ts3\np1\t1.0\t2.0\t3.0\np2\t4\tNA\t6\n";
        let table = parse_expression_table(content).unwrap();
        assert_eq!(table.probe_ids, vec!["p1", "p2"]);
        assert_eq!(table.sample_ids, vec!["s1", "s2", "s3"]);
        assert_eq!(table.values, array![[1.0, 2.0, 3.0], [4.0, 0.0, 6.0]]);
    }

    #[test]
    fn test_parse_non_finite_cells_read_as_zero() {
        let content = "ID,s1,s2,s3,s4\np1,1,NaN,inf,-infinity\n";
        let table = parse_expression_table(content).unwrap();
        assert_eq!(table.values, array![[1.0, 0.0, 0.0, 0.0]]);
        assert!(table.normalized().values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_parse_comma_table_with_quotes() {
        let content = "\"gene\",\"a\",\"b\"\n\"g1\",1.5,2.5\n\n\"g2\",3.5,4.5\n";
        let table = parse_expression_table(content).unwrap();
        assert_eq!(table.probe_ids, vec!["g1", "g2"]);
        assert_eq!(table.sample_ids, vec!["a", "b"]);
        assert_eq!(table.values[[1, 1]], 4.5);
    }

    #[test]
    fn test_parse_rejects_short_row() {
        let content = "ID,s1,s2\np1,1,2\np2,3\n";
        let err = parse_expression_table(content).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(parse_expression_table("").is_err());
        assert!(parse_expression_table("ID,s1\n").is_err());
    }

    #[test]
    fn test_condition_slices_samples() {
        let table = ExpressionTable::new(
            vec!["g1".to_string(), "g2".to_string()],
            vec!["s1".to_string(), "s2".to_string(), "s3".to_string()],
            array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
        )
        .unwrap();

        let condition = table.condition(&[2, 0]).unwrap();
        assert_eq!(condition.matrix(), &array![[3.0, 6.0], [1.0, 4.0]]);
        assert_eq!(condition.gene_ids(), &["g1", "g2"]);
        assert!(table.condition(&[3]).is_err());
    }

    #[test]
    fn test_normalized_centers_sample_columns() {
        let table = ExpressionTable::new(
            vec!["g1".to_string(), "g2".to_string()],
            vec!["s1".to_string(), "s2".to_string()],
            array![[8.0, 1.0], [2.0, 4.0]],
        )
        .unwrap();
        let normalized = table.normalized();
        // log2 gives [[3, 0], [1, 2]]; each column sorted then centered
        assert_eq!(normalized.values, array![[-1.0, -1.0], [1.0, 1.0]]);
    }
}
