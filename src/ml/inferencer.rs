// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Runs an exported classifier on already-encoded words and
// returns one softmax row per word.
use anyhow::Result;
use std::path::Path;
use burn::{prelude::*, tensor::activation::softmax};

use crate::data::{batcher::WordBatcher, encoder::EncodedWord};
use crate::infra::artifacts::{self, ArtifactConfig, WeightFormat};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::WordClassifierModel;

pub struct Inferencer<B: Backend> {
    model:      WordClassifierModel<B>,
    batcher:    WordBatcher<B>,
    num_labels: usize,
}

impl<B: Backend> Inferencer<B> {
    /// Load config.json and the requested weights record from `model_dir`.
    pub fn from_artifacts(
        model_dir: &Path,
        format:    WeightFormat,
        device:    B::Device,
    ) -> Result<(Self, ArtifactConfig)> {
        let (model, config) = artifacts::load_model::<B>(model_dir, format, &device)?;
        tracing::info!(
            "Model loaded from '{}' ({})",
            model_dir.display(),
            format.file_name()
        );
        let inferencer = Self {
            model,
            batcher:    WordBatcher::new(device),
            num_labels: config.model.num_labels,
        };
        Ok((inferencer, config))
    }

    /// Load config.json and the best training checkpoint from `train_dir`.
    pub fn from_checkpoint(train_dir: &Path, device: B::Device) -> Result<(Self, ArtifactConfig)> {
        let config = ArtifactConfig::load(train_dir)?;
        let model  = CheckpointManager::new(train_dir).load_model(config.model.init::<B>(&device), &device)?;
        tracing::info!("Model loaded from checkpoint in '{}'", train_dir.display());
        let inferencer = Self {
            model,
            batcher:    WordBatcher::new(device),
            num_labels: config.model.num_labels,
        };
        Ok((inferencer, config))
    }

    /// Softmax probabilities, one row of `num_labels` per word, in input order.
    pub fn probabilities(&self, words: &[EncodedWord]) -> Result<Vec<Vec<f32>>> {
        if words.is_empty() {
            return Ok(Vec::new());
        }

        let (input_ids, attention_mask) = self.batcher.inputs(words);
        let logits = self.model.forward(input_ids, attention_mask);
        let probs  = softmax(logits, 1);

        let flat: Vec<f32> = probs
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read probabilities: {e:?}"))?;

        Ok(flat.chunks(self.num_labels).map(<[f32]>::to_vec).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::labels::{Category, LabelMap};
    use crate::ml::model::WordClassifierModelConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_probability_rows_sum_to_one() {
        let dir    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let config = WordClassifierModelConfig::new(120, 4, 16, 2, 1, 32, 4);
        let labels = LabelMap::new(&Category::ALL.map(|c| c.as_str())).unwrap();

        ArtifactConfig::new(config.clone(), 4, &labels).save(dir.path()).unwrap();
        let model: WordClassifierModel<TestBackend> = config.init(&device);
        artifacts::save_weights(&model, dir.path(), WeightFormat::Full).unwrap();

        let (inferencer, loaded) =
            Inferencer::<TestBackend>::from_artifacts(dir.path(), WeightFormat::Full, device).unwrap();
        assert_eq!(loaded.max_length, 4);

        let words = vec![
            EncodedWord { input_ids: vec![2, 110, 3, 0], attention_mask: vec![1, 1, 1, 0] },
            EncodedWord { input_ids: vec![2, 1, 3, 0],   attention_mask: vec![1, 1, 1, 0] },
            EncodedWord { input_ids: vec![2, 105, 106, 3], attention_mask: vec![1, 1, 1, 1] },
        ];
        let rows = inferencer.probabilities(&words).unwrap();

        assert_eq!(rows.len(), 3);
        for row in rows {
            assert_eq!(row.len(), 4);
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_empty_input_gives_no_rows() {
        let dir    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let config = WordClassifierModelConfig::new(120, 4, 16, 2, 1, 32, 4);
        let labels = LabelMap::new(&Category::ALL.map(|c| c.as_str())).unwrap();
        ArtifactConfig::new(config.clone(), 4, &labels).save(dir.path()).unwrap();
        let model: WordClassifierModel<TestBackend> = config.init(&device);
        artifacts::save_weights(&model, dir.path(), WeightFormat::Full).unwrap();

        let (inferencer, _) =
            Inferencer::<TestBackend>::from_artifacts(dir.path(), WeightFormat::Full, device).unwrap();
        assert!(inferencer.probabilities(&[]).unwrap().is_empty());
    }
}
