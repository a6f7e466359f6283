use crate::dispersion::significance::SignificanceReport;
use crate::error::Result;
use crate::modules::stats::ModuleStats;
use crate::testing::correction::benjamini_hochberg_correction;
use ndarray::Array2;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

/// Write a square labelled matrix: header row of labels, then one row per label.
pub fn write_labelled_matrix<T, P>(path: P, labels: &[String], matrix: &Array2<T>) -> Result<()>
where
    T: Display,
    P: AsRef<Path>,
{
    let mut writer = csv::Writer::from_path(path)?;
    let mut header = Vec::with_capacity(labels.len() + 1);
    header.push("module".to_string());
    header.extend(labels.iter().cloned());
    writer.write_record(&header)?;

    for (label, row) in labels.iter().zip(matrix.rows()) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(label.clone());
        record.extend(row.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Benjamini-Hochberg adjustment over the distinct module pairs (upper triangle with the
/// diagonal), mirrored back onto the full matrix.
pub fn adjust_p_values(report: &SignificanceReport) -> anyhow::Result<Array2<f64>> {
    let k = report.labels.len();
    let cells: Vec<(usize, usize)> = (0..k).flat_map(|i| (i..k).map(move |j| (i, j))).collect();
    let raw: Vec<f64> = cells.iter().map(|&(i, j)| report.p_values[[i, j]]).collect();
    let adjusted = benjamini_hochberg_correction(&raw)?;

    let mut out = Array2::<f64>::zeros((k, k));
    for (&(i, j), p) in cells.iter().zip(adjusted) {
        out[[i, j]] = p;
        out[[j, i]] = p;
    }
    Ok(out)
}

/// Write `dispersion.csv`, `permutation_counts.csv` and `p_values.csv` into `dir`.
///
/// Returns the paths written.
pub fn write_dispersion_report<P: AsRef<Path>>(
    report: &SignificanceReport,
    dir: P,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let dispersion_path = dir.join("dispersion.csv");
    let counts_path = dir.join("permutation_counts.csv");
    let p_values_path = dir.join("p_values.csv");

    write_labelled_matrix(&dispersion_path, &report.labels, &report.dispersion)?;
    write_labelled_matrix(&counts_path, &report.labels, &report.counts)?;
    write_labelled_matrix(&p_values_path, &report.labels, &report.p_values)?;

    log::info!("Dispersion report written to: {}", dir.display());
    Ok(vec![dispersion_path, counts_path, p_values_path])
}

/// Write a `module,size,statistic,p_value` table.
pub fn write_module_stats<P: AsRef<Path>>(stats: &[ModuleStats], path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record(["module", "size", "statistic", "p_value"])?;
    for s in stats {
        writer.write_record([
            s.module.clone(),
            s.size.to_string(),
            s.statistic.to_string(),
            s.p_value.to_string(),
        ])?;
    }
    writer.flush()?;
    log::info!("Module statistics written to: {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn report() -> SignificanceReport {
        SignificanceReport {
            labels: vec!["blue".to_string(), "red".to_string()],
            dispersion: array![[0.5, 0.25], [0.25, 0.0]],
            counts: array![[1, 40], [40, 100]],
            p_values: array![[0.01, 0.4], [0.4, 1.0]],
            trials: 100,
        }
    }

    #[test]
    fn test_write_dispersion_report() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_dispersion_report(&report(), dir.path()).unwrap();
        assert_eq!(paths.len(), 3);

        let dispersion = fs::read_to_string(&paths[0]).unwrap();
        assert_eq!(dispersion, "module,blue,red\nblue,0.5,0.25\nred,0.25,0\n");
        let counts = fs::read_to_string(&paths[1]).unwrap();
        assert_eq!(counts, "module,blue,red\nblue,1,40\nred,40,100\n");
    }

    #[test]
    fn test_write_module_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let stats = vec![ModuleStats {
            module: "red".to_string(),
            size: 3,
            statistic: 1.5,
            p_value: 0.25,
        }];
        write_module_stats(&stats, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "module,size,statistic,p_value\nred,3,1.5,0.25\n");
    }

    #[test]
    fn test_adjust_p_values_symmetric() {
        let adjusted = adjust_p_values(&report()).unwrap();
        // distinct pairs: 0.01, 0.4, 1.0 -> 0.03, 0.6, 1.0
        assert!((adjusted[[0, 0]] - 0.03).abs() < 1e-12);
        assert!((adjusted[[0, 1]] - 0.6).abs() < 1e-12);
        assert_eq!(adjusted[[0, 1]], adjusted[[1, 0]]);
        assert_eq!(adjusted[[1, 1]], 1.0);
    }
}
