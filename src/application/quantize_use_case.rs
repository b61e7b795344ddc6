// ============================================================
// Layer 2 — QuantizeUseCase
// ============================================================
// Rewrites model.bin as model_quantized.bin with every float
// stored in half precision. The predictor loads either file
// (--quantized picks the smaller one).

use anyhow::Result;
use std::path::PathBuf;

use crate::infra::artifacts::{self, WeightFormat};
use crate::ml::backend::{CpuBackend, CpuDevice};

#[derive(Debug, Clone, PartialEq)]
pub struct QuantizeReport {
    pub quantized_path:  PathBuf,
    pub original_bytes:  u64,
    pub quantized_bytes: u64,
}

impl QuantizeReport {
    /// quantized / original, e.g. 0.5 for a halved file
    pub fn ratio(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        self.quantized_bytes as f64 / self.original_bytes as f64
    }
}

pub struct QuantizeUseCase {
    export_dir: PathBuf,
}

impl QuantizeUseCase {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self { export_dir: export_dir.into() }
    }

    pub fn execute(&self) -> Result<QuantizeReport> {
        let dir    = &self.export_dir;
        let device = CpuDevice::default();

        let (model, _) = artifacts::load_model::<CpuBackend>(dir, WeightFormat::Full, &device)?;
        let quantized_path = artifacts::save_weights(&model, dir, WeightFormat::Half)?;

        let report = QuantizeReport {
            original_bytes:  artifacts::file_size(&WeightFormat::Full.path_in(dir))?,
            quantized_bytes: artifacts::file_size(&quantized_path)?,
            quantized_path,
        };

        tracing::info!(
            "Quantized {} → {} bytes ({:.1}% of original)",
            report.original_bytes,
            report.quantized_bytes,
            report.ratio() * 100.0
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::predict_use_case::tests::write_model_dir;
    use crate::error::ClassifierError;
    use crate::ml::model::WordClassifierModel;

    #[test]
    fn test_quantize_shrinks_model() {
        let dir    = tempfile::tempdir().unwrap();
        let config = write_model_dir(dir.path());
        let model: WordClassifierModel<CpuBackend> = config.init(&Default::default());
        artifacts::save_weights(&model, dir.path(), WeightFormat::Full).unwrap();

        let report = QuantizeUseCase::new(dir.path()).execute().unwrap();
        assert!(report.quantized_path.ends_with("model_quantized.bin"));
        assert!(report.quantized_bytes < report.original_bytes);
        assert!(report.ratio() > 0.0 && report.ratio() < 1.0);
    }

    #[test]
    fn test_quantize_needs_exported_model() {
        let dir = tempfile::tempdir().unwrap();
        write_model_dir(dir.path());

        let err = QuantizeUseCase::new(dir.path()).execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClassifierError>(),
            Some(ClassifierError::FilesNotFound(_))
        ));
    }
}
