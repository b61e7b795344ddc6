// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores training checkpoints.
//
// Layout of the training output directory:
//   distilbert-word-classifier/
//     checkpoint-1.mpk.gz     ← weights after epoch 1
//     checkpoint-2.mpk.gz     ← weights after epoch 2
//     ...
//     latest_epoch.json       ← last epoch written
//     best_checkpoint.json    ← epoch with the lowest eval loss
//     train_config.json       ← hyperparameters of the run
//
// Weights are stored with NamedMpkGzFileRecorder at full
// precision: MessagePack + gzip, type-checked on load so an
// architecture mismatch fails instead of loading garbage.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::WordClassifierModel;

type CheckpointRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

const LATEST_FILE: &str = "latest_epoch.json";
const BEST_FILE:   &str = "best_checkpoint.json";
const CONFIG_FILE: &str = "train_config.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    /// Path of a checkpoint without the recorder's extension.
    fn checkpoint_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("checkpoint-{epoch}"))
    }

    /// Save model weights for a given epoch and advance latest_epoch.json.
    pub fn save_model<B: Backend>(&self, model: &WordClassifierModel<B>, epoch: usize) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let path = self.checkpoint_path(epoch);
        CheckpointRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        write_epoch(&self.dir.join(LATEST_FILE), epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Record which epoch should be used for export and inference.
    pub fn mark_best(&self, epoch: usize) -> Result<()> {
        write_epoch(&self.dir.join(BEST_FILE), epoch)
    }

    /// Best epoch if one was marked, otherwise the latest one.
    pub fn best_epoch(&self) -> Result<usize> {
        let best = self.dir.join(BEST_FILE);
        if best.exists() {
            return read_epoch(&best);
        }
        read_epoch(&self.dir.join(LATEST_FILE)).with_context(|| {
            format!("No checkpoint in '{}'. Have you run 'train' first?", self.dir.display())
        })
    }

    /// Load the best checkpoint into a model of matching architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  WordClassifierModel<B>,
        device: &B::Device,
    ) -> Result<WordClassifierModel<B>> {
        let epoch = self.best_epoch()?;
        self.load_epoch(model, epoch, device)
    }

    pub fn load_epoch<B: Backend>(
        &self,
        model:  WordClassifierModel<B>,
        epoch:  usize,
        device: &B::Device,
    ) -> Result<WordClassifierModel<B>> {
        let path = self.checkpoint_path(epoch);
        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CheckpointRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }
}

fn write_epoch(path: &Path, epoch: usize) -> Result<()> {
    fs::write(path, serde_json::to_string(&epoch)?)
        .with_context(|| format!("Failed to write '{}'", path.display()))
}

fn read_epoch(path: &Path) -> Result<usize> {
    let s = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    Ok(serde_json::from_str::<usize>(&s)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::WordClassifierModelConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn config() -> WordClassifierModelConfig {
        WordClassifierModelConfig::new(40, 4, 8, 2, 1, 16, 4)
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path());
        let device = Default::default();

        let model: WordClassifierModel<TestBackend> = config().init(&device);
        ckpt.save_model(&model, 1).unwrap();
        assert!(dir.path().join("checkpoint-1.mpk.gz").exists());

        let fresh: WordClassifierModel<TestBackend> = config().init(&device);
        let loaded = ckpt.load_model(fresh, &device).unwrap();

        let before = model.classifier.weight.val().into_data();
        let after  = loaded.classifier.weight.val().into_data();
        before.assert_eq(&after, true);
    }

    #[test]
    fn test_best_epoch_prefers_marked_epoch() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path());
        let device = Default::default();

        let model: WordClassifierModel<TestBackend> = config().init(&device);
        ckpt.save_model(&model, 1).unwrap();
        ckpt.save_model(&model, 2).unwrap();
        assert_eq!(ckpt.best_epoch().unwrap(), 2);

        ckpt.mark_best(1).unwrap();
        assert_eq!(ckpt.best_epoch().unwrap(), 1);
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("nothing-here"));
        assert!(ckpt.best_epoch().is_err());
    }
}
