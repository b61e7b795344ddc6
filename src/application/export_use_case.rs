// ============================================================
// Layer 2 — ExportUseCase
// ============================================================
// Turns a training directory into a self-contained inference
// artifact:
//
//   distilbert-word-classifier/          onnx-model/
//     config.json              ──copy──▶   config.json
//     checkpoint-<best>.mpk.gz ──load──▶   model.bin
//     tokenizer.json           ──copy──▶   tokenizer.json
//     tokenizer_config.json    ──copy──▶   tokenizer_config.json
//     special_tokens_map.json  ──copy──▶   special_tokens_map.json
//
// The conversion runs on the CPU backend; no GPU is needed to
// rewrite a record.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::error::ClassifierError;
use crate::infra::{
    artifacts::{self, ArtifactConfig, WeightFormat},
    checkpoint::CheckpointManager,
    tokenizer_store::{SPECIAL_TOKENS_FILE, TOKENIZER_CONFIG_FILE, TOKENIZER_FILE},
};
use crate::ml::backend::{CpuBackend, CpuDevice};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub train_dir:  PathBuf,
    pub export_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            train_dir:  PathBuf::from("distilbert-word-classifier"),
            export_dir: PathBuf::from("onnx-model"),
        }
    }
}

pub struct ExportUseCase {
    config: ExportConfig,
}

impl ExportUseCase {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Returns the path of the written model.bin.
    pub fn execute(&self) -> Result<PathBuf> {
        let train_dir  = &self.config.train_dir;
        let export_dir = &self.config.export_dir;

        let required = [train_dir.join(artifacts::CONFIG_FILE), train_dir.join(TOKENIZER_FILE)];
        let missing: Vec<PathBuf> = required.into_iter().filter(|p| !p.exists()).collect();
        if !missing.is_empty() {
            return Err(ClassifierError::FilesNotFound(missing).into());
        }

        let device = CpuDevice::default();
        let config = ArtifactConfig::load(train_dir)?;
        let model  = CheckpointManager::new(train_dir)
            .load_model(config.model.init::<CpuBackend>(&device), &device)?;

        let model_path = artifacts::save_weights(&model, export_dir, WeightFormat::Full)?;
        config.save(export_dir)?;

        for name in [TOKENIZER_FILE, TOKENIZER_CONFIG_FILE, SPECIAL_TOKENS_FILE] {
            let from = train_dir.join(name);
            if from.exists() {
                fs::copy(&from, export_dir.join(name))
                    .with_context(|| format!("Cannot copy '{}'", from.display()))?;
            }
        }

        tracing::info!(
            "Exported '{}' ({} bytes)",
            model_path.display(),
            artifacts::file_size(&model_path)?
        );
        Ok(model_path)
    }
}
