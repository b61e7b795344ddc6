// ============================================================
// Layer 2 — WordCategoryPredictor
// ============================================================
// Loads a trained classifier and answers "which category is this
// word?" with a label, its confidence and the full distribution.
//
// The model directory can be either:
//   - an export directory   (config.json + model.bin, or
//                            model_quantized.bin with --quantized)
//   - a training directory  (config.json + checkpoint-N.mpk.gz),
//                            in which case the best epoch is used
//
// The tokenizer is always read from `tokenizer_dir`.

use anyhow::Result;
use burn::prelude::Backend;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::encoder::WordEncoder;
use crate::domain::{
    labels::LabelMap,
    prediction::PredictionResult,
    traits::WordPredictor,
};
use crate::error::ClassifierError;
use crate::infra::{artifacts::WeightFormat, tokenizer_store::TokenizerStore};
use crate::ml::{backend::DeviceKind, inferencer::Inferencer};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    pub model_dir:     PathBuf,
    pub tokenizer_dir: PathBuf,
    pub device:        DeviceKind,
    pub max_length:    usize,
    pub batch_size:    usize,
    /// Load model_quantized.bin instead of model.bin
    pub quantized:     bool,
}

impl PredictionConfig {
    pub fn new(model_dir: impl Into<PathBuf>, tokenizer_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir:     model_dir.into(),
            tokenizer_dir: tokenizer_dir.into(),
            device:        DeviceKind::Cpu,
            max_length:    16,
            batch_size:    32,
            quantized:     false,
        }
    }
}

struct LoadedModel<B: Backend> {
    inferencer: Inferencer<B>,
    encoder:    WordEncoder,
    labels:     LabelMap,
}

pub struct WordCategoryPredictor<B: Backend> {
    config: PredictionConfig,
    device: B::Device,
    loaded: Option<LoadedModel<B>>,
}

impl<B: Backend> WordCategoryPredictor<B> {
    pub fn new(config: PredictionConfig, device: B::Device) -> Self {
        Self { config, device, loaded: None }
    }

    /// Read config.json, weights and tokenizer.
    /// Any failure is logged and returned as `Model initialization failed`
    /// with the cause attached.
    pub fn load_model(&mut self) -> Result<()> {
        match self.load_parts() {
            Ok(loaded) => {
                tracing::info!(
                    "Model and tokenizer loaded successfully. Using device: {}",
                    self.config.device
                );
                self.loaded = Some(loaded);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load model or tokenizer: {:#}", e);
                Err(ClassifierError::ModelInit(e.into()).into())
            }
        }
    }

    fn load_parts(&self) -> Result<LoadedModel<B>> {
        let dir    = &self.config.model_dir;
        let format = if self.config.quantized { WeightFormat::Half } else { WeightFormat::Full };

        let (inferencer, artifact) = if format.path_in(dir).exists() {
            Inferencer::from_artifacts(dir, format, self.device.clone())?
        } else if self.config.quantized {
            return Err(ClassifierError::FilesNotFound(vec![format.path_in(dir)]).into());
        } else {
            Inferencer::from_checkpoint(dir, self.device.clone())?
        };

        // The position table bounds how many tokens the model accepts.
        let max_length = self.config.max_length.min(artifact.model.max_seq_len);
        let tokenizer  = TokenizerStore::new(&self.config.tokenizer_dir).load()?;
        let encoder    = WordEncoder::new(tokenizer, max_length)?;
        let labels     = artifact.labels()?;

        Ok(LoadedModel { inferencer, encoder, labels })
    }

    fn loaded(&self) -> Result<&LoadedModel<B>, ClassifierError> {
        self.loaded.as_ref().ok_or(ClassifierError::NotInitialized("Model or tokenizer"))
    }

    pub fn predict(&self, word: &str) -> Result<PredictionResult> {
        let loaded = self.loaded()?;
        self.run(loaded, &[word.to_string()])
            .and_then(|mut results| results.pop().ok_or_else(|| anyhow::anyhow!("No prediction returned")))
            .inspect_err(|e| tracing::error!("Prediction failed for word '{}': {:#}", word, e))
    }

    /// Predict in chunks of `batch_size`, keeping input order.
    pub fn predict_batch(&self, words: &[String], batch_size: usize) -> Result<Vec<PredictionResult>> {
        if words.is_empty() {
            return Ok(Vec::new());
        }
        let loaded = self.loaded()?;

        let mut results = Vec::with_capacity(words.len());
        for chunk in words.chunks(batch_size.max(1)) {
            let batch = self.run(loaded, chunk).inspect_err(|e| {
                tracing::error!("Batch prediction failed for batch starting with '{}': {:#}", chunk[0], e)
            })?;
            results.extend(batch);
        }
        Ok(results)
    }

    fn run(&self, loaded: &LoadedModel<B>, words: &[String]) -> Result<Vec<PredictionResult>> {
        let encoded = loaded.encoder.encode_all(words)?;
        let rows    = loaded.inferencer.probabilities(&encoded)?;

        words
            .iter()
            .zip(rows)
            .map(|(word, probs)| {
                PredictionResult::from_probabilities(word, &probs, &loaded.labels)
                    .ok_or_else(|| anyhow::anyhow!("Prediction for '{word}' has no matching label"))
            })
            .collect()
    }
}

impl<B: Backend> WordPredictor for WordCategoryPredictor<B> {
    fn predict(&self, word: &str) -> Result<PredictionResult> {
        WordCategoryPredictor::predict(self, word)
    }

    fn predict_batch(&self, words: &[String]) -> Result<Vec<PredictionResult>> {
        WordCategoryPredictor::predict_batch(self, words, self.config.batch_size)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::labels::Category;
    use crate::infra::artifacts::{self, ArtifactConfig};
    use crate::infra::checkpoint::CheckpointManager;
    use crate::infra::tokenizer_store;
    use crate::ml::model::{WordClassifierModel, WordClassifierModelConfig};
    use burn::backend::NdArray;
    use std::path::Path;

    type TestBackend = NdArray;

    pub(crate) const VOCAB: [&str; 6] = ["run", "deploy", "teacher", "dog", "laptop", "quick"];

    /// Write tokenizer.json + config.json into `dir` and return the model config.
    pub(crate) fn write_model_dir(dir: &Path) -> WordClassifierModelConfig {
        let words: Vec<String> = VOCAB.iter().map(|w| w.to_string()).collect();
        let tok    = TokenizerStore::new(dir).build_and_save(&words).unwrap();
        let config = WordClassifierModelConfig::new(tokenizer_store::vocab_size(&tok), 8, 16, 2, 1, 32, 4);
        let labels = LabelMap::new(&Category::ALL.map(|c| c.as_str())).unwrap();
        ArtifactConfig::new(config.clone(), 8, &labels).save(dir).unwrap();
        config
    }

    /// Directory laid out like `export` output.
    pub(crate) fn exported_model(dir: &Path) {
        let config = write_model_dir(dir);
        let model: WordClassifierModel<TestBackend> = config.init(&Default::default());
        artifacts::save_weights(&model, dir, WeightFormat::Full).unwrap();
        artifacts::save_weights(&model, dir, WeightFormat::Half).unwrap();
    }

    /// Directory laid out like `train` output, with one checkpoint.
    pub(crate) fn trained_model(dir: &Path) {
        let config = write_model_dir(dir);
        let model: WordClassifierModel<TestBackend> = config.init(&Default::default());
        CheckpointManager::new(dir).save_model(&model, 1).unwrap();
    }

    fn predictor(dir: &Path) -> WordCategoryPredictor<TestBackend> {
        WordCategoryPredictor::new(PredictionConfig::new(dir, dir), Default::default())
    }

    #[test]
    fn test_predict_before_load_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = predictor(dir.path()).predict("run").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClassifierError>(),
            Some(ClassifierError::NotInitialized("Model or tokenizer"))
        ));
        assert_eq!(err.to_string(), "Model or tokenizer not initialized");
    }

    #[test]
    fn test_load_failure_is_model_init_error() {
        let dir   = tempfile::tempdir().unwrap();
        let mut p = predictor(&dir.path().join("missing"));
        let err   = p.load_model().unwrap_err();
        assert_eq!(err.to_string(), "Model initialization failed");
        assert!(p.loaded.is_none());
    }

    #[test]
    fn test_predict_returns_full_distribution() {
        let dir = tempfile::tempdir().unwrap();
        exported_model(dir.path());
        let mut p = predictor(dir.path());
        p.load_model().unwrap();

        let result = p.predict("deploy").unwrap();
        assert_eq!(result.word, "deploy");
        assert_eq!(result.all_probabilities.len(), 4);
        assert_eq!(result.all_probabilities[&result.label], result.confidence);
        let sum: f32 = result.all_probabilities.values().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert!(result.category().is_some());
    }

    #[test]
    fn test_predict_batch_keeps_order_across_chunks() {
        let dir = tempfile::tempdir().unwrap();
        exported_model(dir.path());
        let mut p = predictor(dir.path());
        p.load_model().unwrap();

        let words: Vec<String> = ["run", "dog", "zebra", "quick", "teacher"]
            .iter().map(|w| w.to_string()).collect();
        let results = p.predict_batch(&words, 2).unwrap();
        let order: Vec<&str> = results.iter().map(|r| r.word.as_str()).collect();
        assert_eq!(order, ["run", "dog", "zebra", "quick", "teacher"]);

        // Same word, same answer whether batched or not.
        let single = p.predict("dog").unwrap();
        assert_eq!(single.label, results[1].label);
        assert!((single.confidence - results[1].confidence).abs() < 1e-5);

        assert!(p.predict_batch(&[], 2).unwrap().is_empty());
    }

    #[test]
    fn test_quantized_and_checkpoint_sources() {
        let exported = tempfile::tempdir().unwrap();
        exported_model(exported.path());
        let mut cfg = PredictionConfig::new(exported.path(), exported.path());
        cfg.quantized = true;
        let mut q = WordCategoryPredictor::<TestBackend>::new(cfg, Default::default());
        q.load_model().unwrap();
        assert_eq!(q.predict("run").unwrap().all_probabilities.len(), 4);

        let trained = tempfile::tempdir().unwrap();
        trained_model(trained.path());
        let mut t = predictor(trained.path());
        t.load_model().unwrap();
        assert_eq!(t.predict("laptop").unwrap().all_probabilities.len(), 4);
    }
}
