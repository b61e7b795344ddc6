// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load word lists             (Layer 4 - data)
//   Step 2: Build the label map         (Layer 3 - domain)
//   Step 3: Resolve the tokenizer       (Layer 6 - infra)
//   Step 4: Initialise the model        (Layer 5 - ml)
//   Step 5: Split + tokenise            (Layer 4 - data)
//   Step 6: Save config and tokenizer   (Layer 6 - infra)
//   Step 7: Run training loop           (Layer 5 - ml)
//
// WordClassifier holds the state between steps so each one can
// be called (and tested) on its own. Calling a step before its
// inputs exist fails with ClassifierError::NotInitialized.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

use crate::data::{
    dataset::{WordDataset, WordSample},
    encoder::WordEncoder,
    loader::DatasetLoader,
    splitter::split_train_test,
};
use crate::domain::{
    dataset_item::DatasetItem,
    labels::{Category, LabelMap},
    traits::DatasetSource,
};
use crate::error::ClassifierError;
use crate::infra::{
    artifacts::{self, ArtifactConfig},
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    pretrained::PretrainedFiles,
    tokenizer_store::{self, TokenizerStore},
};
use crate::ml::backend::DeviceKind;
use crate::ml::model::WordClassifierModelConfig;
use crate::ml::trainer::{run_training, ModelInit, WarmStart};

pub use crate::ml::trainer::EvalMetrics;

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings for a training run. Serialisable so it can be saved
// next to the checkpoints as a record of how they were produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Label → word-list file, in class-id order
    pub dataset_files:  Vec<(String, PathBuf)>,
    /// Hub model id the tokenizer and pretrained weights are fetched from
    pub model_name:     String,
    /// Skip the hub: word-level tokenizer, randomly initialised encoder
    pub offline:        bool,
    /// Exported artifact (model.bin) or DistilBERT checkpoint (model.safetensors)
    pub base_model_dir: Option<PathBuf>,
    pub output_dir:     PathBuf,
    pub max_length:     usize,
    pub test_size:      f64,
    pub random_seed:    u64,
    pub num_epochs:     usize,
    pub batch_size:     usize,
    pub learning_rate:  f64,
    pub logging_steps:  usize,
    pub d_model:        usize,
    pub num_heads:      usize,
    pub num_layers:     usize,
    pub d_ff:           usize,
    pub dropout:        f64,
    pub device:         DeviceKind,
}

impl TrainConfig {
    pub fn default_dataset_files(dir: &Path) -> Vec<(String, PathBuf)> {
        Category::ALL
            .iter()
            .map(|c| {
                let file = format!("{}s.txt", c.display_name());
                (c.as_str().to_string(), dir.join(file))
            })
            .collect()
    }

    pub fn class_names(&self) -> Vec<String> {
        self.dataset_files.iter().map(|(label, _)| label.clone()).collect()
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dataset_files:  Self::default_dataset_files(Path::new("dataset")),
            model_name:     "distilbert-base-cased".to_string(),
            offline:        false,
            base_model_dir: None,
            output_dir:     PathBuf::from("distilbert-word-classifier"),
            max_length:     16,
            test_size:      0.1,
            random_seed:    50,
            num_epochs:     7,
            batch_size:     32,
            learning_rate:  2e-5,
            logging_steps:  50,
            d_model:        768,
            num_heads:      12,
            num_layers:     6,
            d_ff:           3072,
            dropout:        0.1,
            device:         DeviceKind::Cpu,
        }
    }
}

// ─── WordClassifier ───────────────────────────────────────────────────────────
pub struct WordClassifier {
    config:  TrainConfig,
    labels:  LabelMap,
    encoder: Option<WordEncoder>,
    model:   Option<ModelInit>,
}

impl WordClassifier {
    pub fn new(config: TrainConfig) -> Self {
        Self { config, labels: LabelMap::default(), encoder: None, model: None }
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn setup_labels<S: AsRef<str>>(&mut self, class_names: &[S]) -> Result<(), ClassifierError> {
        self.labels = LabelMap::new(class_names)?;
        tracing::info!("Labels: {}", self.labels.labels().join(", "));
        Ok(())
    }

    /// Configure truncation and padding on `tokenizer` and keep it.
    pub fn set_tokenizer(&mut self, tokenizer: Tokenizer) -> Result<(), ClassifierError> {
        self.encoder = Some(WordEncoder::new(tokenizer, self.config.max_length)?);
        Ok(())
    }

    /// Decide the architecture and where the encoder weights come from.
    ///
    /// In order of preference:
    ///   1. an exported artifact in the base model directory,
    ///   2. a DistilBERT checkpoint (config.json + model.safetensors)
    ///      in the base model directory,
    ///   3. the `model_name` checkpoint fetched from the hub,
    ///   4. random weights, only when running offline.
    ///
    /// Warm-started models keep the base architecture; a fresh model
    /// is sized from the tokenizer vocabulary and the configured dimensions.
    pub fn init_model(&mut self, base_model: Option<&Path>) -> Result<(), ClassifierError> {
        let encoder = self.encoder.as_ref().ok_or(ClassifierError::NotInitialized("Tokenizer"))?;
        if self.labels.is_empty() {
            return Err(ClassifierError::NotInitialized("Labels"));
        }

        let cfg        = &self.config;
        let num_labels = self.labels.len();
        let vocab_size = tokenizer_store::vocab_size(encoder.tokenizer());

        let init = if let Some(dir) = base_model.filter(|dir| artifacts::is_pretrained_dir(dir)) {
            let base = ArtifactConfig::load(dir).map_err(|e| ClassifierError::ModelInit(e.into()))?;
            tracing::info!("Warm-starting encoder from exported model '{}'", dir.display());
            ModelInit {
                config:     base.model.with_labels(num_labels),
                warm_start: Some(WarmStart::Exported(dir.to_path_buf())),
            }
        } else if let Some(files) = self.pretrained_files(base_model)? {
            let hf = files.load_config().map_err(|e| ClassifierError::ModelInit(e.into()))?;
            tracing::info!("Warm-starting encoder from '{}'", files.weights.display());
            ModelInit {
                config:     hf.model_config(num_labels),
                warm_start: Some(WarmStart::Pretrained(files)),
            }
        } else {
            tracing::warn!("No pretrained weights; the encoder starts from random init");
            let config = WordClassifierModelConfig::new(
                vocab_size, cfg.max_length, cfg.d_model,
                cfg.num_heads, cfg.num_layers, cfg.d_ff, num_labels,
            )
            .with_dropout(cfg.dropout);
            ModelInit { config, warm_start: None }
        };

        if init.config.max_seq_len < cfg.max_length {
            return Err(ClassifierError::ModelInit(format!(
                "base model supports {} tokens, max_length is {}",
                init.config.max_seq_len, cfg.max_length
            ).into()));
        }
        if vocab_size > init.config.vocab_size {
            return Err(ClassifierError::ModelInit(format!(
                "tokenizer has {} ids but the base model embeds {}",
                vocab_size, init.config.vocab_size
            ).into()));
        }
        init.config
            .validate()
            .map_err(|msg| ClassifierError::ModelInit(msg.into()))?;

        tracing::info!(
            "Model initialised: vocab={}, seq_len={}, {} labels",
            init.config.vocab_size, init.config.max_seq_len, num_labels
        );
        self.model = Some(init);
        Ok(())
    }

    /// Local checkpoint in `base_model`, else the hub's `model_name` unless offline.
    fn pretrained_files(&self, base_model: Option<&Path>) -> Result<Option<PretrainedFiles>, ClassifierError> {
        if let Some(files) = base_model.and_then(PretrainedFiles::in_dir) {
            return Ok(Some(files));
        }
        if self.config.offline {
            return Ok(None);
        }
        PretrainedFiles::fetch(&self.config.model_name)
            .map(Some)
            .map_err(|e| ClassifierError::ModelInit(e.into()))
    }

    /// Tokenise words and attach label ids.
    pub fn preprocess(&self, items: &[DatasetItem]) -> Result<Vec<WordSample>, ClassifierError> {
        let encoder = self.encoder.as_ref().ok_or(ClassifierError::NotInitialized("Tokenizer"))?;
        items
            .iter()
            .map(|item| -> Result<WordSample, ClassifierError> {
                let label = self.labels.id_of(&item.label)?;
                Ok(encoder.encode(&item.text)?.into_sample(label))
            })
            .collect()
    }

    /// Seeded shuffle, train/test split, then tokenisation of both halves.
    pub fn prepare_datasets(
        &self,
        data: Vec<DatasetItem>,
    ) -> Result<(WordDataset, WordDataset), ClassifierError> {
        let (train, test) = split_train_test(data, self.config.test_size, self.config.random_seed);
        let train = WordDataset::new(self.preprocess(&train)?);
        let test  = WordDataset::new(self.preprocess(&test)?);
        tracing::info!("Split: {} train, {} test", train.sample_count(), test.sample_count());
        Ok((train, test))
    }

    /// Train, evaluate every epoch and keep the best checkpoint.
    /// Writes config.json, the tokenizer files, train_config.json,
    /// metrics.csv and checkpoints into `output_dir`.
    pub fn train(&self, train: WordDataset, test: WordDataset) -> Result<EvalMetrics> {
        let init    = self.model.as_ref().ok_or(ClassifierError::NotInitialized("Model"))?;
        let encoder = self.encoder.as_ref().ok_or(ClassifierError::NotInitialized("Tokenizer"))?;

        self.run(init, encoder, train, test)
            .map_err(|e| ClassifierError::Training(format!("{e:#}")).into())
    }

    fn run(
        &self,
        init:    &ModelInit,
        encoder: &WordEncoder,
        train:   WordDataset,
        test:    WordDataset,
    ) -> Result<EvalMetrics> {
        let cfg = &self.config;
        let out = cfg.output_dir.as_path();

        let ckpt = CheckpointManager::new(out);
        ckpt.save_config(cfg)?;
        ArtifactConfig::new(init.config.clone(), cfg.max_length, &self.labels).save(out)?;
        TokenizerStore::new(out).save_pretrained(encoder.tokenizer(), cfg.max_length)?;

        let metrics = MetricsLogger::new(out)?;
        run_training(cfg, init, train, test, &ckpt, &metrics)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<EvalMetrics> {
        let cfg = &self.config;

        // ── Step 1: Load word lists ───────────────────────────────────────────
        let loader = DatasetLoader::new(cfg.dataset_files.clone());
        let data   = loader.load_data()?;

        // ── Step 2: Labels ────────────────────────────────────────────────────
        let mut classifier = WordClassifier::new(cfg.clone());
        classifier.setup_labels(&cfg.class_names())?;

        // ── Step 3: Tokenizer ─────────────────────────────────────────────────
        let words: Vec<String> = data.iter().map(|item| item.text.clone()).collect();
        let hub_id    = (!cfg.offline).then_some(cfg.model_name.as_str());
        let tokenizer = TokenizerStore::new(&cfg.output_dir)
            .resolve(cfg.base_model_dir.as_deref(), hub_id, &words)?;
        classifier.set_tokenizer(tokenizer)?;

        // ── Step 4: Model ─────────────────────────────────────────────────────
        classifier.init_model(cfg.base_model_dir.as_deref())?;

        // ── Step 5: Datasets ──────────────────────────────────────────────────
        let (train, test) = classifier.prepare_datasets(data)?;
        let counts = train.class_counts(classifier.labels().len());
        for (id, count) in counts.iter().enumerate() {
            if let Some(label) = classifier.labels().label_of(id) {
                tracing::info!("  {:<10} {} train samples", label, count);
            }
        }

        // ── Step 6 + 7: Train ─────────────────────────────────────────────────
        let result = classifier.train(train, test)?;
        tracing::info!(
            "Best epoch {} | eval_loss={:.4} | eval_accuracy={:.4}",
            result.best_epoch, result.eval_loss, result.eval_accuracy
        );
        Ok(result)
    }
}
