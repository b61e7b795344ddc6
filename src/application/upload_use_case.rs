// ============================================================
// Layer 2 — UploadUseCase
// ============================================================
// Publishes the exported model to the registry in one commit.
//
// Upload plan (local → path in repo):
//   <export>/model.bin              → model.bin
//   <export>/model_quantized.bin    → onnx/model_quantized.bin
//   <export>/config.json            → config.json
//   <train>/tokenizer.json          → tokenizer.json
//   <train>/tokenizer_config.json   → tokenizer_config.json    (optional)
//   <train>/special_tokens_map.json → special_tokens_map.json  (optional)
//   info.md                         → README.md
//
// The whole plan is checked before the registry is touched: every
// missing required file is reported at once, missing optional
// files are skipped with a warning.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::traits::{Registry, RepoTarget, UploadFile};
use crate::error::ClassifierError;
use crate::infra::{
    artifacts::{WeightFormat, CONFIG_FILE},
    tokenizer_store::{SPECIAL_TOKENS_FILE, TOKENIZER_CONFIG_FILE, TOKENIZER_FILE},
};

pub const DEFAULT_REPO_ID: &str = "mbalabash/distilbert_subjects_actions_objects_descriptors";

const COMMIT_SUMMARY: &str = "Upload word category classifier";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub repo_id:    String,
    pub export_dir: PathBuf,
    /// Training output holding the tokenizer files
    pub train_dir:  PathBuf,
    /// Model card, uploaded as README.md
    pub readme:     PathBuf,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            repo_id:    DEFAULT_REPO_ID.to_string(),
            export_dir: PathBuf::from("onnx-model"),
            train_dir:  PathBuf::from("distilbert-word-classifier"),
            readme:     PathBuf::from("info.md"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub file:     UploadFile,
    pub required: bool,
}

impl PlannedFile {
    fn new(local: &Path, path_in_repo: &str, required: bool) -> Self {
        Self {
            file: UploadFile { local: local.to_path_buf(), path_in_repo: path_in_repo.to_string() },
            required,
        }
    }
}

pub fn upload_plan(cfg: &UploadConfig) -> Vec<PlannedFile> {
    let export = &cfg.export_dir;
    let train  = &cfg.train_dir;
    let quantized_in_repo = format!("onnx/{}", WeightFormat::Half.file_name());

    vec![
        PlannedFile::new(&WeightFormat::Full.path_in(export), &WeightFormat::Full.file_name(), true),
        PlannedFile::new(&WeightFormat::Half.path_in(export), &quantized_in_repo, true),
        PlannedFile::new(&export.join(CONFIG_FILE), CONFIG_FILE, true),
        PlannedFile::new(&train.join(TOKENIZER_FILE), TOKENIZER_FILE, true),
        PlannedFile::new(&train.join(TOKENIZER_CONFIG_FILE), TOKENIZER_CONFIG_FILE, false),
        PlannedFile::new(&train.join(SPECIAL_TOKENS_FILE), SPECIAL_TOKENS_FILE, false),
        PlannedFile::new(&cfg.readme, "README.md", true),
    ]
}

/// Files to upload, or every missing required path.
pub fn validate_plan(plan: Vec<PlannedFile>) -> Result<Vec<UploadFile>, ClassifierError> {
    let mut files   = Vec::with_capacity(plan.len());
    let mut missing = Vec::new();

    for planned in plan {
        if planned.file.local.exists() {
            files.push(planned.file);
        } else if planned.required {
            missing.push(planned.file.local);
        } else {
            tracing::warn!("Skipping optional file '{}' (not found)", planned.file.local.display());
        }
    }

    if missing.is_empty() {
        Ok(files)
    } else {
        Err(ClassifierError::FilesNotFound(missing))
    }
}

pub struct UploadUseCase<R: Registry> {
    config:   UploadConfig,
    registry: R,
}

impl<R: Registry> UploadUseCase<R> {
    pub fn new(config: UploadConfig, registry: R) -> Self {
        Self { config, registry }
    }

    /// Upload the plan and return the repository URL.
    pub fn execute(&self) -> Result<String> {
        let files  = validate_plan(upload_plan(&self.config))?;
        let target = RepoTarget::model(&self.config.repo_id);

        for f in &files {
            tracing::info!("{} → {}", f.local.display(), f.path_in_repo);
        }
        self.registry.upload(&target, &files, COMMIT_SUMMARY)?;

        Ok(self.registry.repo_url(&self.config.repo_id))
    }
}
