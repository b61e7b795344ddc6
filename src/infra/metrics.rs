// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:         the epoch number (1, 2, 3, ...)
//   - train_loss:    average cross-entropy loss on the train split
//   - eval_loss:     average cross-entropy loss on the test split
//   - eval_accuracy: fraction of test words whose argmax matches
//
// Output file: <output_dir>/metrics.csv
//
// Example CSV output:
//   epoch,train_loss,eval_loss,eval_accuracy
//   1,1.312400,1.208800,0.471000
//   2,0.954100,0.921300,0.652000
//   ...
//
// An empty test split gives eval_loss = NaN, written as "NaN".
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

const HEADER: &str = "epoch,train_loss,eval_loss,eval_accuracy";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average cross-entropy loss over all training batches
    pub train_loss: f64,

    /// Average cross-entropy loss on the test split, NaN when it is empty
    pub eval_loss: f64,

    /// Range: [0.0, 1.0]
    pub eval_accuracy: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, eval_loss: f64, eval_accuracy: f64) -> Self {
        Self { epoch, train_loss, eval_loss, eval_accuracy }
    }

    /// True if this epoch beat the best eval loss so far.
    /// A NaN loss never counts as an improvement.
    pub fn is_improvement(&self, best_eval_loss: Option<f64>) -> bool {
        if self.eval_loss.is_nan() {
            return false;
        }
        match best_eval_loss {
            Some(best) => self.eval_loss < best,
            None       => true,
        }
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet,
    /// so repeated runs append to the same log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.eval_loss, m.eval_accuracy,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, eval_loss={:.4}",
            m.epoch, m.train_loss, m.eval_loss,
        );
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 1.5, 1.3, 0.5);
        assert!(m.is_improvement(None));
        assert!(m.is_improvement(Some(2.0)));
        assert!(!m.is_improvement(Some(1.0)));
    }

    #[test]
    fn test_nan_loss_is_never_an_improvement() {
        let m = EpochMetrics::new(1, 1.5, f64::NAN, 0.0);
        assert!(!m.is_improvement(None));
        assert!(!m.is_improvement(Some(10.0)));
    }

    #[test]
    fn test_log_appends_rows_under_one_header() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 1.0, 0.9, 0.25)).unwrap();
        logger.log(&EpochMetrics::new(2, 0.8, 0.7, 0.5)).unwrap();

        // A second logger on the same dir must not repeat the header.
        let again = MetricsLogger::new(dir.path()).unwrap();
        again.log(&EpochMetrics::new(3, 0.6, f64::NAN, 0.0)).unwrap();

        let csv   = fs::read_to_string(&logger.csv_path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "1,1.000000,0.900000,0.250000");
        assert!(lines[3].starts_with("3,0.600000,NaN"));
    }
}
