// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Appends one row per epoch to metrics.csv in the output
// directory:
//
//   epoch,train_loss,val_loss,precision,recall,f1,accuracy
//   1,0.612345,0.587654,0.701000,0.650000,0.674500,0.690000
//   2,...
//
// Each training run starts a fresh file: MetricsLogger::new
// truncates it and writes the header, log() appends rows.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::ml::evaluation::ClassificationReport;

pub const METRICS_FILE: &str = "metrics.csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    /// Mean training loss over all batches of the epoch
    pub train_loss: f64,
    /// Mean validation loss (sample-weighted)
    pub val_loss:   f64,
    pub precision:  f64,
    pub recall:     f64,
    pub f1:         f64,
    pub accuracy:   f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, report: &ClassificationReport) -> Self {
        Self {
            epoch,
            train_loss,
            val_loss,
            precision: report.precision,
            recall:    report.recall,
            f1:        report.f1,
            accuracy:  report.accuracy,
        }
    }

    /// Strictly lower validation loss than the best so far
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let csv_path = dir.join(METRICS_FILE);

        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "epoch,train_loss,val_loss,precision,recall,f1,accuracy")?;
        tracing::debug!("Started metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.val_loss, m.precision, m.recall, m.f1, m.accuracy,
        )?;

        tracing::debug!("Logged epoch {} metrics", m.epoch);
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(epoch: usize, val_loss: f64) -> EpochMetrics {
        EpochMetrics::new(epoch, 0.7, val_loss, &ClassificationReport::default())
    }

    #[test]
    fn test_is_improvement_is_strict() {
        let m = metrics(2, 0.5);
        assert!(m.is_improvement(0.6));
        assert!(!m.is_improvement(0.5));
        assert!(m.is_improvement(f64::INFINITY));
    }

    #[test]
    fn test_rows_follow_header() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&metrics(1, 0.6)).unwrap();
        logger.log(&metrics(2, 0.5)).unwrap();

        let contents = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("epoch,"));
        assert!(lines[2].starts_with("2,0.700000,0.500000"));
    }

    #[test]
    fn test_new_run_replaces_previous_rows() {
        let dir = tempfile::tempdir().unwrap();
        let first = MetricsLogger::new(dir.path()).unwrap();
        first.log(&metrics(1, 0.6)).unwrap();
        first.log(&metrics(2, 0.5)).unwrap();

        let second = MetricsLogger::new(dir.path()).unwrap();
        second.log(&metrics(1, 0.4)).unwrap();

        let contents = fs::read_to_string(second.csv_path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("1,0.700000,0.400000"));
    }
}
